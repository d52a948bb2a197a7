use std::collections::HashSet;

use crate::catalog::BufferId;
use crate::error::CompileError;
use crate::pattern::Span;

/// One line of context around a hit, with the hit's character range inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPreview {
    pub text: String,
    pub match_start: usize,
    pub match_end: usize,
}

/// A content hit inside a buffer's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub buffer_id: BufferId,
    pub start: usize,
    pub end: usize,
    pub line_number: usize,
    pub end_line_number: usize,
    pub column_start: usize,
    pub column_end: usize,
    pub preview: MatchPreview,
}

impl Match {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// A hit inside a buffer's title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleMatch {
    pub buffer_id: BufferId,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultGroup {
    pub buffer_id: BufferId,
    pub title: String,
    pub is_closed: bool,
    pub title_match: Option<TitleMatch>,
    pub matches: Vec<Match>,
}

impl ResultGroup {
    pub fn is_title_only(&self) -> bool {
        self.matches.is_empty() && self.title_match.is_some()
    }

    /// Content hits are authoritative; a title-only group counts as one result.
    pub fn result_count(&self) -> usize {
        if self.is_title_only() {
            1
        } else {
            self.matches.len()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    /// No query is active.
    Idle,
    NoResults,
    Results,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    pub query: String,
    pub groups: Vec<ResultGroup>,
    pub total_match_count: usize,
    pub buffer_count: usize,
    pub limit_reached: bool,
    pub error: Option<CompileError>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failed(query: impl Into<String>, error: CompileError) -> Self {
        Self {
            query: query.into(),
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn from_groups(query: impl Into<String>, groups: Vec<ResultGroup>, limit_reached: bool) -> Self {
        let total_match_count = groups.iter().map(ResultGroup::result_count).sum();
        let buffer_count = groups.len();
        Self {
            query: query.into(),
            groups,
            total_match_count,
            buffer_count,
            limit_reached,
            error: None,
        }
    }

    pub fn status(&self) -> ResultStatus {
        if self.error.is_some() {
            ResultStatus::Error
        } else if self.query.is_empty() {
            ResultStatus::Idle
        } else if self.groups.is_empty() {
            ResultStatus::NoResults
        } else {
            ResultStatus::Results
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, buffer_id: BufferId) -> Option<&ResultGroup> {
        self.groups.iter().find(|group| group.buffer_id == buffer_id)
    }

    /// `"3 results in 2 tabs"`, or `None` when there is nothing to summarize.
    pub fn summary(&self) -> Option<String> {
        if self.status() != ResultStatus::Results {
            return None;
        }

        let count = self.total_match_count;
        let tabs = self.buffer_count;
        Some(format!(
            "{}{} result{} in {} tab{}",
            count,
            if self.limit_reached { "+" } else { "" },
            if count == 1 { "" } else { "s" },
            tabs,
            if tabs == 1 { "" } else { "s" },
        ))
    }

    pub fn get(&self, target: ResultRef) -> Option<Target<'_>> {
        let group = self.groups.get(target.group())?;
        match target {
            ResultRef::Header { .. } => Some(Target::Header(group)),
            ResultRef::Content { index, .. } => group
                .matches
                .get(index)
                .map(|found| Target::Content(group, found)),
        }
    }
}

/// Position of one navigable entry in a [`ResultSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultRef {
    /// A group's header: the stand-in for title-only and collapsed groups.
    Header { group: usize },
    Content { group: usize, index: usize },
}

impl ResultRef {
    pub fn group(&self) -> usize {
        match *self {
            Self::Header { group } | Self::Content { group, .. } => group,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Header(&'a ResultGroup),
    Content(&'a ResultGroup, &'a Match),
}

impl<'a> Target<'a> {
    pub fn group(&self) -> &'a ResultGroup {
        match *self {
            Self::Header(group) | Self::Content(group, _) => group,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Header(_) => None,
            Self::Content(_, found) => Some(found.span()),
        }
    }
}

/// Flattened traversal order: groups in order, then their matches in order.
pub fn flatten(result_set: &ResultSet) -> Vec<ResultRef> {
    flatten_with(result_set, &HashSet::new())
}

fn flatten_with(result_set: &ResultSet, collapsed: &HashSet<BufferId>) -> Vec<ResultRef> {
    let mut entries = Vec::with_capacity(result_set.total_match_count);
    for (group_index, group) in result_set.groups.iter().enumerate() {
        if group.matches.is_empty() || collapsed.contains(&group.buffer_id) {
            entries.push(ResultRef::Header { group: group_index });
            continue;
        }

        entries.extend((0..group.matches.len()).map(|index| ResultRef::Content {
            group: group_index,
            index,
        }));
    }
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Keyboard cursor over the flattened results.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    entries: Vec<ResultRef>,
    active: Option<usize>,
    collapsed: HashSet<BufferId>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds traversal for a new result set. The cursor starts unset.
    pub fn rebuild(&mut self, result_set: &ResultSet) {
        self.entries = flatten_with(result_set, &self.collapsed);
        self.active = None;
    }

    pub fn entries(&self) -> &[ResultRef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<ResultRef> {
        self.active.and_then(|i| self.entries.get(i).copied())
    }

    /// 1-based position of the cursor and the entry count.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.active.map(|i| (i + 1, self.entries.len()))
    }

    pub fn navigate(&mut self, direction: Direction) -> Option<ResultRef> {
        if self.entries.is_empty() {
            return None;
        }

        let len = self.entries.len();
        let index = match (direction, self.active) {
            (Direction::Next, Some(i)) => (i + 1) % len,
            (Direction::Next, None) => 0,
            (Direction::Prev, Some(i)) => (i + len - 1) % len,
            (Direction::Prev, None) => len - 1,
        };
        self.active = Some(index);
        self.entries.get(index).copied()
    }

    pub fn select(&mut self, index: usize) -> Option<ResultRef> {
        if index < self.entries.len() {
            self.active = Some(index);
            self.entries.get(index).copied()
        } else {
            None
        }
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    pub fn is_collapsed(&self, buffer_id: BufferId) -> bool {
        self.collapsed.contains(&buffer_id)
    }

    /// Collapses or expands a group. The cursor follows the active entry when
    /// it survives, and lands on the group header when it was inside it.
    pub fn toggle_group(&mut self, result_set: &ResultSet, buffer_id: BufferId) -> bool {
        let collapsed = if self.collapsed.remove(&buffer_id) {
            false
        } else {
            self.collapsed.insert(buffer_id);
            true
        };

        let previous = self.active();
        self.entries = flatten_with(result_set, &self.collapsed);
        self.active = previous.and_then(|target| {
            self.entries
                .iter()
                .position(|entry| *entry == target)
                .or_else(|| {
                    self.entries.iter().position(|entry| {
                        *entry
                            == ResultRef::Header {
                                group: target.group(),
                            }
                    })
                })
        });

        collapsed
    }
}
