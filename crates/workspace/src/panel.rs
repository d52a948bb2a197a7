use std::fmt::Write as _;

use querydesk_search::{
    BufferId, Navigator, ResultGroup, ResultRef, ResultSet, ResultStatus, Target,
};

const MARK_OPEN: &str = "**";
const MARK_CLOSE: &str = "**";

/// Plain-text rendering of the results panel. Entries are numbered from 1 in
/// traversal order, and the active one is marked with `>`.
pub fn render_panel(results: &ResultSet, navigator: &Navigator, preview: Option<BufferId>) -> String {
    let mut out = String::new();

    match results.status() {
        ResultStatus::Idle => {
            out.push_str("Search all tabs\n");
            return out;
        }
        ResultStatus::Error => {
            let message = results
                .error
                .as_ref()
                .map(|error| error.message())
                .unwrap_or_default();
            let _ = writeln!(out, "Error: {message}");
            return out;
        }
        ResultStatus::NoResults => {
            out.push_str("No results\n");
            return out;
        }
        ResultStatus::Results => {
            if let Some(summary) = results.summary() {
                let _ = writeln!(out, "{summary}");
            }
        }
    }

    let active = navigator.active_index();
    for (position, entry) in navigator.entries().iter().enumerate() {
        let cursor = if active == Some(position) { '>' } else { ' ' };
        let number = position + 1;

        match results.get(*entry) {
            Some(Target::Header(group)) => {
                let folded = if group.matches.is_empty() {
                    String::new()
                } else {
                    format!(" [+{}]", group.matches.len())
                };
                let _ = writeln!(
                    out,
                    "{cursor} {number:>3}  {}{folded}",
                    group_header(group, preview)
                );
            }
            Some(Target::Content(group, found)) => {
                if entry_index(entry) == Some(0) {
                    let _ = writeln!(out, "       {} ({})", group_header(group, preview), group.matches.len());
                }
                let _ = writeln!(
                    out,
                    "{cursor} {number:>3}    {}:{}  {}",
                    found.line_number,
                    found.column_start,
                    mark_chars(&found.preview.text, found.preview.match_start, found.preview.match_end)
                );
            }
            None => {}
        }
    }

    out
}

fn entry_index(entry: &ResultRef) -> Option<usize> {
    match *entry {
        ResultRef::Content { index, .. } => Some(index),
        ResultRef::Header { .. } => None,
    }
}

fn group_header(group: &ResultGroup, preview: Option<BufferId>) -> String {
    let marker = if preview == Some(group.buffer_id) {
        "[preview] "
    } else if group.is_closed {
        "[closed] "
    } else {
        ""
    };

    let title = match group.title_match {
        Some(hit) if group.title.is_char_boundary(hit.start) && group.title.is_char_boundary(hit.end) => {
            format!(
                "{}{MARK_OPEN}{}{MARK_CLOSE}{}",
                &group.title[..hit.start],
                &group.title[hit.start..hit.end],
                &group.title[hit.end..]
            )
        }
        _ => group.title.clone(),
    };

    format!("{marker}{title}")
}

/// Wraps the character range `[start, end)` of `text` in markers.
fn mark_chars(text: &str, start: usize, end: usize) -> String {
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(offset, _)| offset)
            .unwrap_or(text.len())
    };
    let (start, end) = (byte_at(start), byte_at(end.max(start)));

    format!(
        "{}{MARK_OPEN}{}{MARK_CLOSE}{}",
        &text[..start],
        &text[start..end],
        &text[end..]
    )
}
