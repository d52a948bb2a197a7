use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use flume::{Receiver, Sender};
use querydesk_search::{
    BufferEvent, BufferHost, BufferId, BufferRef, DEFAULT_CLOSED_RETENTION, HostError, Span,
};

use crate::error::SessionError;

pub const DEFAULT_MAX_TABS: usize = 100;
const DEFAULT_TITLE: &str = "SQL";

/// One editor buffer, open or closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    pub id: BufferId,
    pub title: String,
    pub text: Arc<str>,
    pub version: u64,
    /// Set while closed, and kept by a preview tab so discarding it puts the
    /// buffer back where it was in the closed list.
    closed_at_seq: Option<u64>,
}

impl Buffer {
    pub fn closed_at_seq(&self) -> Option<u64> {
        self.closed_at_seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Permanent,
    Preview,
}

/// The editor's tab strip plus the buffers closed from it.
#[derive(Debug)]
pub struct Workspace {
    tabs: Vec<Buffer>,
    closed: Vec<Buffer>,
    preview: Option<BufferId>,
    active: Option<BufferId>,
    highlights: HashMap<BufferId, Span>,
    next_id: u64,
    last_seq: u64,
    retention: usize,
    max_tabs: usize,
    events: Option<Sender<BufferEvent>>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSED_RETENTION, DEFAULT_MAX_TABS)
    }
}

impl Workspace {
    pub fn new(retention: usize, max_tabs: usize) -> Self {
        Self {
            tabs: Vec::new(),
            closed: Vec::new(),
            preview: None,
            active: None,
            highlights: HashMap::new(),
            next_id: 1,
            last_seq: 0,
            retention,
            max_tabs: max_tabs.max(1),
            events: None,
        }
    }

    /// Routes every later mutation to the returned receiver.
    pub fn subscribe(&mut self) -> Receiver<BufferEvent> {
        let (tx, rx) = flume::unbounded();
        self.events = Some(tx);
        rx
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn set_retention(&mut self, retention: usize) {
        self.retention = retention;
        self.evict();
    }

    pub fn max_tabs(&self) -> usize {
        self.max_tabs
    }

    /// Open tabs in tab order, the preview included.
    pub fn tabs(&self) -> &[Buffer] {
        &self.tabs
    }

    pub fn closed_tabs(&self) -> &[Buffer] {
        &self.closed
    }

    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.tabs.iter().chain(&self.closed).find(|b| b.id == id)
    }

    /// `None` when the buffer is not open.
    pub fn tab_kind(&self, id: BufferId) -> Option<TabKind> {
        self.tab_position(id).map(|_| {
            if self.preview == Some(id) {
                TabKind::Preview
            } else {
                TabKind::Permanent
            }
        })
    }

    pub fn preview(&self) -> Option<BufferId> {
        self.preview
    }

    pub fn active(&self) -> Option<BufferId> {
        self.active
    }

    pub fn highlight(&self, id: BufferId) -> Option<Span> {
        self.highlights.get(&id).copied()
    }

    pub fn open_tab(&mut self, title: Option<&str>, text: &str) -> Result<BufferId, SessionError> {
        if self.tabs.len() >= self.max_tabs {
            return Err(SessionError::TabLimit {
                limit: self.max_tabs,
            });
        }

        let title = match title.map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.next_default_title(),
        };

        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.tabs.push(Buffer {
            id,
            title,
            text: text.into(),
            version: 0,
            closed_at_seq: None,
        });
        self.active = Some(id);
        self.emit(BufferEvent::Opened(id));
        Ok(id)
    }

    /// Replaces an open tab's text. Typing into a preview keeps it.
    pub fn edit(&mut self, id: BufferId, text: &str) -> Result<(), SessionError> {
        let tab = self
            .tabs
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(SessionError::NotFound(id))?;

        tab.text = text.into();
        tab.version += 1;
        self.highlights.remove(&id);
        self.emit(BufferEvent::Edited(id));
        self.commit_from_editor(id);
        Ok(())
    }

    pub fn rename(&mut self, id: BufferId, title: &str) -> Result<(), SessionError> {
        let buffer = self
            .tabs
            .iter_mut()
            .chain(self.closed.iter_mut())
            .find(|b| b.id == id)
            .ok_or(SessionError::NotFound(id))?;

        buffer.title = title.trim().to_string();
        self.emit(BufferEvent::Edited(id));
        Ok(())
    }

    /// Moves an open tab to the closed list. A preview tab returns to its
    /// previous place there.
    pub fn close_tab(&mut self, id: BufferId) -> Result<(), SessionError> {
        let position = self.tab_position(id).ok_or(SessionError::NotFound(id))?;
        let mut buffer = self.tabs.remove(position);
        self.highlights.remove(&id);

        if self.preview == Some(id) {
            self.preview = None;
            log::debug!("discarding preview tab {id}");
        } else {
            self.last_seq += 1;
            buffer.closed_at_seq = Some(self.last_seq);
        }
        self.closed.push(buffer);

        if self.active == Some(id) {
            self.active = self
                .tabs
                .get(position)
                .or_else(|| position.checked_sub(1).and_then(|p| self.tabs.get(p)))
                .map(|b| b.id);
        }

        self.emit(BufferEvent::Closed(id));
        self.evict();
        Ok(())
    }

    pub fn reorder_tab(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        if from >= self.tabs.len() {
            return Err(SessionError::InvalidPosition(from));
        }
        if to >= self.tabs.len() {
            return Err(SessionError::InvalidPosition(to));
        }

        let tab = self.tabs.remove(from);
        let id = tab.id;
        self.tabs.insert(to, tab);
        // tab order drives result order
        self.emit(BufferEvent::Edited(id));
        Ok(())
    }

    /// Focuses a tab from the tab strip. Focusing a preview this way commits it.
    pub fn activate(&mut self, id: BufferId) -> Result<(), SessionError> {
        self.tab_position(id).ok_or(SessionError::NotFound(id))?;
        self.active = Some(id);
        self.commit_from_editor(id);
        Ok(())
    }

    fn tab_position(&self, id: BufferId) -> Option<usize> {
        self.tabs.iter().position(|b| b.id == id)
    }

    fn next_default_title(&self) -> String {
        let taken: HashSet<&str> = self
            .tabs
            .iter()
            .chain(&self.closed)
            .map(|b| b.title.as_str())
            .collect();

        if !taken.contains(DEFAULT_TITLE) {
            return DEFAULT_TITLE.to_string();
        }

        let mut number = 1;
        loop {
            let title = format!("{DEFAULT_TITLE} {number}");
            if !taken.contains(title.as_str()) {
                return title;
            }
            number += 1;
        }
    }

    fn commit_from_editor(&mut self, id: BufferId) {
        if self.preview == Some(id) {
            self.commit(id);
        }
    }

    fn commit(&mut self, id: BufferId) {
        self.preview = None;
        if let Some(position) = self.tab_position(id) {
            let mut tab = self.tabs.remove(position);
            tab.closed_at_seq = None;
            self.tabs.push(tab);
        }
        log::debug!("committed preview tab {id}");
        self.emit(BufferEvent::Committed(id));
    }

    fn evict(&mut self) {
        while self.closed.len() > self.retention {
            let Some(oldest) = self
                .closed
                .iter()
                .enumerate()
                .min_by_key(|(_, b)| b.closed_at_seq)
                .map(|(index, _)| index)
            else {
                break;
            };

            let buffer = self.closed.remove(oldest);
            log::debug!("evicting closed tab {} ({:?})", buffer.id, buffer.title);
            self.highlights.remove(&buffer.id);
            self.emit(BufferEvent::Evicted(buffer.id));
        }
    }

    fn emit(&self, event: BufferEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            log::trace!("no listener for {event:?}");
        }
    }
}

impl BufferHost for Workspace {
    fn list_buffers(&self) -> Vec<BufferRef> {
        let open = self.tabs.iter().map(|b| {
            BufferRef::open(b.id, b.title.clone(), b.text.clone()).with_version(b.version)
        });
        let closed = self.closed.iter().map(|b| {
            BufferRef::closed(b.id, b.title.clone(), b.text.clone(), b.closed_at_seq.unwrap_or(0))
                .with_version(b.version)
        });
        open.chain(closed).collect()
    }

    fn request_activate(&mut self, id: BufferId) -> Result<(), HostError> {
        self.tab_position(id).ok_or(HostError::NotFound(id))?;
        self.active = Some(id);
        Ok(())
    }

    fn request_highlight(&mut self, id: BufferId, span: Span) -> Result<(), HostError> {
        let tab = self
            .tabs
            .iter()
            .find(|b| b.id == id)
            .ok_or(HostError::NotFound(id))?;

        let text = &tab.text;
        if span.end > text.len() || !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
            return Err(HostError::StaleResult);
        }

        self.highlights.insert(id, span);
        Ok(())
    }

    fn clear_highlight(&mut self, id: BufferId) -> Result<(), HostError> {
        self.buffer(id).ok_or(HostError::NotFound(id))?;
        self.highlights.remove(&id);
        Ok(())
    }

    fn request_open_preview(&mut self, id: BufferId) -> Result<(), HostError> {
        if self.preview == Some(id) {
            self.active = Some(id);
            return Ok(());
        }

        // take the target out first so re-closing the old preview cannot evict it
        let position = self
            .closed
            .iter()
            .position(|b| b.id == id)
            .ok_or(HostError::NotFound(id))?;
        let buffer = self.closed.remove(position);

        if let Some(previous) = self.preview
            && let Err(error) = self.close_tab(previous)
        {
            log::debug!("previous preview {previous} already gone: {error}");
        }

        self.tabs.push(buffer);
        self.preview = Some(id);
        self.active = Some(id);
        self.emit(BufferEvent::Reopened(id));
        Ok(())
    }

    fn request_discard_preview(&mut self, id: BufferId) -> Result<(), HostError> {
        if self.preview != Some(id) {
            return Err(HostError::NotFound(id));
        }
        self.close_tab(id).map_err(|_| HostError::NotFound(id))
    }

    fn request_commit(&mut self, id: BufferId) -> Result<(), HostError> {
        if self.preview == Some(id) {
            self.commit(id);
            return Ok(());
        }

        self.tab_position(id)
            .map(|_| ())
            .ok_or(HostError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(buffers: &[Buffer]) -> Vec<&str> {
        buffers.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn default_titles_use_lowest_free_number() {
        let mut workspace = Workspace::default();
        let first = workspace.open_tab(None, "").unwrap();
        workspace.open_tab(None, "").unwrap();
        workspace.open_tab(Some("  trades  "), "").unwrap();
        workspace.open_tab(None, "").unwrap();
        assert_eq!(titles(workspace.tabs()), vec!["SQL", "SQL 1", "trades", "SQL 2"]);

        workspace.rename(first, "renamed").unwrap();
        workspace.open_tab(Some(""), "").unwrap();
        assert_eq!(workspace.tabs().last().map(|b| b.title.as_str()), Some("SQL"));
    }

    #[test]
    fn tab_limit_is_enforced() {
        let mut workspace = Workspace::new(10, 2);
        workspace.open_tab(None, "").unwrap();
        workspace.open_tab(None, "").unwrap();
        assert!(matches!(
            workspace.open_tab(None, ""),
            Err(SessionError::TabLimit { limit: 2 })
        ));
    }

    #[test]
    fn edits_bump_version_and_clear_highlight() {
        let mut workspace = Workspace::default();
        let id = workspace.open_tab(None, "select 1").unwrap();
        workspace.request_highlight(id, Span::new(0, 6)).unwrap();

        workspace.edit(id, "select 2").unwrap();
        assert_eq!(workspace.buffer(id).map(|b| b.version), Some(1));
        assert_eq!(workspace.highlight(id), None);
        assert!(matches!(
            workspace.edit(BufferId(99), ""),
            Err(SessionError::NotFound(BufferId(99)))
        ));
    }

    #[test]
    fn closing_assigns_sequence_and_moves_focus() {
        let mut workspace = Workspace::default();
        let a = workspace.open_tab(None, "").unwrap();
        let b = workspace.open_tab(None, "").unwrap();
        let c = workspace.open_tab(None, "").unwrap();

        workspace.activate(b).unwrap();
        workspace.close_tab(b).unwrap();
        assert_eq!(workspace.active(), Some(c));

        workspace.close_tab(c).unwrap();
        assert_eq!(workspace.active(), Some(a));

        let seqs: Vec<_> = workspace.closed_tabs().iter().map(Buffer::closed_at_seq).collect();
        assert_eq!(seqs, vec![Some(1), Some(2)]);
    }

    #[test]
    fn oldest_closed_tabs_are_evicted() {
        let mut workspace = Workspace::new(2, 10);
        let events = workspace.subscribe();
        let ids: Vec<_> = (0..3).map(|_| workspace.open_tab(None, "").unwrap()).collect();
        for id in &ids {
            workspace.close_tab(*id).unwrap();
        }

        assert_eq!(workspace.closed_tabs().len(), 2);
        assert!(workspace.buffer(ids[0]).is_none());
        assert!(events.try_iter().any(|e| e == BufferEvent::Evicted(ids[0])));
    }

    #[test]
    fn reorder_moves_tab_and_validates_positions() {
        let mut workspace = Workspace::default();
        workspace.open_tab(Some("a"), "").unwrap();
        workspace.open_tab(Some("b"), "").unwrap();
        workspace.open_tab(Some("c"), "").unwrap();

        workspace.reorder_tab(2, 0).unwrap();
        assert_eq!(titles(workspace.tabs()), vec!["c", "a", "b"]);
        assert!(matches!(
            workspace.reorder_tab(0, 3),
            Err(SessionError::InvalidPosition(3))
        ));
    }

    #[test]
    fn list_buffers_reports_open_and_closed() {
        let mut workspace = Workspace::default();
        let a = workspace.open_tab(None, "one").unwrap();
        let b = workspace.open_tab(None, "two").unwrap();
        workspace.close_tab(a).unwrap();

        let buffers = workspace.list_buffers();
        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers[0].id, b);
        assert!(buffers[1].is_closed());
        assert_eq!(buffers[1].closed_at_seq, Some(1));
    }

    #[test]
    fn preview_opens_and_replaces_previous() {
        let mut workspace = Workspace::default();
        let a = workspace.open_tab(None, "a").unwrap();
        let b = workspace.open_tab(None, "b").unwrap();
        workspace.open_tab(None, "c").unwrap();
        workspace.close_tab(a).unwrap();
        workspace.close_tab(b).unwrap();

        workspace.request_open_preview(a).unwrap();
        assert_eq!(workspace.tab_kind(a), Some(TabKind::Preview));
        assert_eq!(workspace.active(), Some(a));

        workspace.request_open_preview(b).unwrap();
        assert_eq!(workspace.tab_kind(a), None);
        assert_eq!(workspace.preview(), Some(b));
        // a went back with its original sequence number
        assert_eq!(workspace.buffer(a).and_then(Buffer::closed_at_seq), Some(1));
    }

    #[test]
    fn replacing_preview_at_retention_keeps_target() {
        let mut workspace = Workspace::new(2, 10);
        workspace.open_tab(Some("a"), "").unwrap();
        let b = workspace.open_tab(Some("b"), "b").unwrap();
        let c = workspace.open_tab(Some("c"), "c").unwrap();
        let d = workspace.open_tab(Some("d"), "d").unwrap();
        workspace.close_tab(b).unwrap();
        workspace.close_tab(c).unwrap();
        workspace.request_open_preview(c).unwrap();
        workspace.close_tab(d).unwrap();
        assert_eq!(workspace.closed_tabs().len(), 2);

        workspace.request_open_preview(b).unwrap();
        assert_eq!(workspace.preview(), Some(b));
        assert_eq!(workspace.tab_kind(b), Some(TabKind::Preview));
        assert!(workspace.buffer(c).is_some());
        assert_eq!(workspace.buffer(c).and_then(Buffer::closed_at_seq), Some(2));
        assert_eq!(workspace.closed_tabs().len(), 2);
    }

    #[test]
    fn missing_preview_target_leaves_current_preview() {
        let mut workspace = Workspace::default();
        workspace.open_tab(Some("a"), "").unwrap();
        let b = workspace.open_tab(Some("b"), "").unwrap();
        workspace.close_tab(b).unwrap();
        workspace.request_open_preview(b).unwrap();

        assert_eq!(
            workspace.request_open_preview(BufferId(99)),
            Err(HostError::NotFound(BufferId(99)))
        );
        assert_eq!(workspace.preview(), Some(b));
        assert_eq!(workspace.tab_kind(b), Some(TabKind::Preview));
    }

    #[test]
    fn commit_makes_preview_permanent_at_end() {
        let mut workspace = Workspace::default();
        let a = workspace.open_tab(Some("a"), "").unwrap();
        workspace.open_tab(Some("b"), "").unwrap();
        workspace.close_tab(a).unwrap();
        workspace.request_open_preview(a).unwrap();
        workspace.open_tab(Some("c"), "").unwrap();

        workspace.request_commit(a).unwrap();
        assert_eq!(workspace.tab_kind(a), Some(TabKind::Permanent));
        assert_eq!(titles(workspace.tabs()), vec!["b", "c", "a"]);
        assert_eq!(workspace.buffer(a).and_then(Buffer::closed_at_seq), None);
    }

    #[test]
    fn editor_activity_commits_preview() {
        let mut workspace = Workspace::default();
        let a = workspace.open_tab(None, "a").unwrap();
        let b = workspace.open_tab(None, "b").unwrap();
        workspace.close_tab(a).unwrap();
        workspace.close_tab(b).unwrap();
        let events = workspace.subscribe();

        workspace.request_open_preview(a).unwrap();
        workspace.activate(a).unwrap();
        assert_eq!(workspace.preview(), None);

        workspace.request_open_preview(b).unwrap();
        workspace.edit(b, "typed").unwrap();
        assert_eq!(workspace.tab_kind(b), Some(TabKind::Permanent));

        let received: Vec<_> = events.try_iter().collect();
        assert!(received.contains(&BufferEvent::Committed(a)));
        assert!(received.contains(&BufferEvent::Committed(b)));
    }

    #[test]
    fn host_requests_fail_for_unknown_buffers() {
        let mut workspace = Workspace::default();
        let missing = BufferId(42);
        assert_eq!(workspace.request_activate(missing), Err(HostError::NotFound(missing)));
        assert_eq!(workspace.request_open_preview(missing), Err(HostError::NotFound(missing)));
        assert_eq!(workspace.request_commit(missing), Err(HostError::NotFound(missing)));
        assert_eq!(workspace.request_discard_preview(missing), Err(HostError::NotFound(missing)));
    }

    #[test]
    fn stale_highlight_is_rejected() {
        let mut workspace = Workspace::default();
        let id = workspace.open_tab(None, "abc").unwrap();
        assert_eq!(
            workspace.request_highlight(id, Span::new(1, 10)),
            Err(HostError::StaleResult)
        );
        workspace.request_highlight(id, Span::new(1, 3)).unwrap();
        assert_eq!(workspace.highlight(id), Some(Span::new(1, 3)));
        workspace.clear_highlight(id).unwrap();
        assert_eq!(workspace.highlight(id), None);
    }
}
