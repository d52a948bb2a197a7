use std::collections::HashSet;
use std::time::Instant;

use crate::catalog::{BufferRef, in_scope};
use crate::line_index::{LineIndex, LineIndexCache};
use crate::pattern::{Matcher, SearchOptions, Span};
use crate::results::{Match, MatchPreview, ResultGroup, ResultSet, TitleMatch};

pub const DEFAULT_MAX_MATCHES: usize = 10_000;

/// Characters of line context kept on each side of a hit in its preview.
const PREVIEW_CONTEXT: usize = 25;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Content hits collected across all buffers before the scan stops.
    pub max_matches: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

/// Runs queries over buffer snapshots, keeping line indexes warm between runs.
#[derive(Debug, Default)]
pub struct SearchEngine {
    config: SearchConfig,
    line_indexes: LineIndexCache,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            line_indexes: LineIndexCache::new(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SearchConfig) {
        self.config = config;
    }

    pub fn cached_line_indexes(&self) -> &LineIndexCache {
        &self.line_indexes
    }

    /// Searches every in-scope buffer of `snapshot`. Buffers appear in the
    /// result in snapshot order; hits within a buffer by ascending offset.
    pub fn run(&mut self, snapshot: &[BufferRef], query: &str, options: &SearchOptions) -> ResultSet {
        if query.is_empty() {
            return ResultSet::empty();
        }

        let matcher = match Matcher::compile(query, options) {
            Ok(matcher) => matcher,
            Err(error) => {
                log::debug!("query {query:?} failed to compile: {error}");
                return ResultSet::failed(query, error);
            }
        };

        let started = Instant::now();
        let mut groups = Vec::new();
        let mut collected = 0;
        let mut limit_reached = false;

        for buffer in in_scope(snapshot, options.include_deleted) {
            let remaining = self.config.max_matches.saturating_sub(collected);
            let mut spans: Vec<Span> = matcher.find_all(&buffer.text).take(remaining + 1).collect();
            if spans.len() > remaining {
                spans.truncate(remaining);
                limit_reached = true;
            }

            let title_match = matcher.find_first(&buffer.title).map(|span| TitleMatch {
                buffer_id: buffer.id,
                start: span.start,
                end: span.end,
            });

            if !spans.is_empty() || title_match.is_some() {
                let index = self
                    .line_indexes
                    .get_or_build(buffer.id, buffer.version, &buffer.text);
                let matches: Vec<Match> = spans
                    .into_iter()
                    .map(|span| resolve_match(buffer, index, span))
                    .collect();
                collected += matches.len();

                groups.push(ResultGroup {
                    buffer_id: buffer.id,
                    title: buffer.title.clone(),
                    is_closed: buffer.is_closed(),
                    title_match,
                    matches,
                });
            }

            if limit_reached {
                log::debug!("match limit {} reached in buffer {}", self.config.max_matches, buffer.id);
                break;
            }
        }

        let known: HashSet<_> = snapshot.iter().map(|buffer| buffer.id).collect();
        self.line_indexes.retain(|id| known.contains(&id));

        let result = ResultSet::from_groups(query, groups, limit_reached);
        log::debug!(
            "search {query:?} found {} results in {} buffers in {:?}",
            result.total_match_count,
            result.buffer_count,
            started.elapsed()
        );
        result
    }
}

/// One-shot search without a persistent line index cache.
pub fn search(snapshot: &[BufferRef], query: &str, options: &SearchOptions) -> ResultSet {
    SearchEngine::default().run(snapshot, query, options)
}

fn resolve_match(buffer: &BufferRef, index: &LineIndex, span: Span) -> Match {
    let text: &str = &buffer.text;
    let start = index.resolve(text, span.start);
    let end_line_number = index.line_number(span.end.saturating_sub(1).max(span.start));
    let end = index.resolve_on_line(text, end_line_number, span.end);

    let line = text.get(index.line_range(start.line_number)).unwrap_or_default();
    let end_line = text.get(index.line_range(end_line_number)).unwrap_or_default();
    // a hit that swallows the newline still ends on its own line
    let column_end = end.column.min(end_line.chars().count() + 1);

    let match_start = start.column - 1;
    let match_end = if end_line_number == start.line_number {
        column_end - 1
    } else {
        line.chars().count()
    };

    Match {
        buffer_id: buffer.id,
        start: span.start,
        end: span.end,
        line_number: start.line_number,
        end_line_number,
        column_start: start.column,
        column_end,
        preview: build_preview(line, match_start, match_end),
    }
}

/// Cuts `line` down to the hit plus surrounding context. Positions are in
/// characters.
fn build_preview(line: &str, match_start: usize, match_end: usize) -> MatchPreview {
    let line_chars = line.chars().count();
    let from = match_start.saturating_sub(PREVIEW_CONTEXT);
    let to = (match_end + PREVIEW_CONTEXT).min(line_chars);

    let byte_at = |n: usize| {
        line.char_indices()
            .nth(n)
            .map(|(offset, _)| offset)
            .unwrap_or(line.len())
    };

    let mut text = String::new();
    let mut shift = 0;
    if from > 0 {
        text.push_str(ELLIPSIS);
        shift = ELLIPSIS.len();
    }
    text.push_str(&line[byte_at(from)..byte_at(to)]);
    if to < line_chars {
        text.push_str(ELLIPSIS);
    }

    MatchPreview {
        text,
        match_start: match_start - from + shift,
        match_end: match_end - from + shift,
    }
}
