use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use crate::catalog::BufferId;

/// 1-based line and character column of a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line_number: usize,
    pub column: usize,
}

/// Byte offsets where each line of a text starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn build(text: &str) -> Self {
        let mut line_starts = Vec::with_capacity(text.len() / 32 + 1);
        line_starts.push(0);
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(offset, _)| offset + 1),
        );

        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line containing `offset`.
    pub fn line_number(&self, offset: usize) -> usize {
        let offset = offset.min(self.len);
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Byte range of a 1-based line, without its terminating newline.
    pub fn line_range(&self, line_number: usize) -> Range<usize> {
        let index = line_number.clamp(1, self.line_count()) - 1;
        let start = self.line_starts[index];
        let end = self
            .line_starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        start..end
    }

    /// `text` must be the text this index was built from.
    pub fn resolve(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(self.len);
        self.resolve_on_line(text, self.line_number(offset), offset)
    }

    /// Column of `offset` counted from the start of `line_number`, for offsets
    /// that sit on a line boundary but belong to the line before it.
    pub fn resolve_on_line(&self, text: &str, line_number: usize, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line_number = line_number.clamp(1, self.line_count());
        let line_start = self.line_starts[line_number - 1].min(offset);
        let column = text
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start)
            + 1;

        Position {
            line_number,
            column,
        }
    }
}

/// Per-buffer line indexes. An entry is reused only while both the version
/// and the text it was built from still match.
#[derive(Debug, Default)]
pub struct LineIndexCache {
    entries: HashMap<BufferId, CachedIndex>,
}

#[derive(Debug)]
struct CachedIndex {
    version: u64,
    text: Arc<str>,
    index: LineIndex,
}

impl CachedIndex {
    fn build(version: u64, text: &Arc<str>) -> Self {
        Self {
            version,
            text: Arc::clone(text),
            index: LineIndex::build(text),
        }
    }

    fn is_valid_for(&self, version: u64, text: &Arc<str>) -> bool {
        self.version == version && (Arc::ptr_eq(&self.text, text) || *self.text == **text)
    }
}

impl LineIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, id: BufferId, version: u64, text: &Arc<str>) -> &LineIndex {
        let entry = self
            .entries
            .entry(id)
            .or_insert_with(|| CachedIndex::build(version, text));

        if !entry.is_valid_for(version, text) {
            log::trace!("rebuilding line index for buffer {id} at version {version}");
            *entry = CachedIndex::build(version, text);
        }

        &entry.index
    }

    pub fn invalidate(&mut self, id: BufferId) {
        self.entries.remove(&id);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(BufferId) -> bool) {
        self.entries.retain(|id, _| keep(*id));
    }

    pub fn contains(&self, id: BufferId, version: u64) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|cached| cached.version == version)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_lines_and_columns() {
        let text = "first\nsecond line\n\nlast";
        let index = LineIndex::build(text);

        assert_eq!(index.line_count(), 4);
        assert_eq!(
            index.resolve(text, 0),
            Position {
                line_number: 1,
                column: 1
            }
        );
        assert_eq!(
            index.resolve(text, 13),
            Position {
                line_number: 2,
                column: 8
            }
        );
        assert_eq!(index.line_number(18), 3);
        assert_eq!(index.line_number(19), 4);
    }

    #[test]
    fn newline_belongs_to_the_line_it_ends() {
        let text = "ab\ncd";
        let index = LineIndex::build(text);
        assert_eq!(index.line_number(2), 1);
        assert_eq!(index.line_number(3), 2);
    }

    #[test]
    fn line_ranges_exclude_newline() {
        let text = "ab\ncd\n";
        let index = LineIndex::build(text);
        assert_eq!(&text[index.line_range(1)], "ab");
        assert_eq!(&text[index.line_range(2)], "cd");
        assert_eq!(&text[index.line_range(3)], "");
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let text = "h\u{e9}llo w\u{f6}rld";
        let index = LineIndex::build(text);
        let offset = text.find("rld").unwrap();
        assert_eq!(index.resolve(text, offset).column, 9);
    }

    #[test]
    fn end_offsets_resolve_on_the_line_they_close() {
        let text = "abc\ndef";
        let index = LineIndex::build(text);
        // exclusive end right before the newline still belongs to line 1
        assert_eq!(
            index.resolve_on_line(text, 1, 3),
            Position {
                line_number: 1,
                column: 4
            }
        );
        assert_eq!(index.resolve(text, 4).line_number, 2);
    }

    #[test]
    fn long_documents_resolve_last_line() {
        let mut text = String::new();
        for i in 0..100 {
            text.push_str(&format!("-- line {i}\n"));
        }
        text.push_str("needle");
        let index = LineIndex::build(&text);
        let offset = text.find("needle").unwrap();
        assert_eq!(index.resolve(&text, offset).line_number, 101);
    }

    #[test]
    fn cache_rebuilds_on_version_change() {
        let mut cache = LineIndexCache::new();
        let id = BufferId(1);
        let text: Arc<str> = Arc::from("a\nb");

        assert_eq!(cache.get_or_build(id, 1, &text).line_count(), 2);
        assert!(cache.contains(id, 1));
        assert_eq!(cache.get_or_build(id, 1, &text).line_count(), 2);

        assert_eq!(cache.get_or_build(id, 2, &Arc::from("a\nb\nc")).line_count(), 3);
        assert!(!cache.contains(id, 1));

        cache.get_or_build(BufferId(2), 0, &Arc::from("x"));
        cache.invalidate(id);
        assert_eq!(cache.len(), 1);

        cache.retain(|id| id != BufferId(2));
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_rebuilds_when_text_changes_without_version() {
        let mut cache = LineIndexCache::new();
        let id = BufferId(1);

        assert_eq!(cache.get_or_build(id, 0, &Arc::from("x")).line_count(), 1);

        let grown: Arc<str> = Arc::from("x\ny\nz\nw\nv\nneedle");
        let index = cache.get_or_build(id, 0, &grown);
        assert_eq!(index.line_count(), 6);
        assert_eq!(index.line_number(grown.find("needle").unwrap()), 6);

        // equal contents in a fresh allocation keep the entry
        let copy: Arc<str> = Arc::from(&*grown);
        assert_eq!(cache.get_or_build(id, 0, &copy).line_count(), 6);
    }
}
