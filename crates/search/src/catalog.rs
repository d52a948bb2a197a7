use std::fmt;
use std::sync::Arc;

use crate::error::HostError;
use crate::pattern::Span;

pub const DEFAULT_CLOSED_RETENTION: usize = 50;

/// Stable identity of an editor buffer across open, close and reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Open,
    Closed,
}

/// One buffer as seen by a search cycle. Text is shared, so snapshots are cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferRef {
    pub id: BufferId,
    pub title: String,
    pub text: Arc<str>,
    pub state: BufferState,
    pub closed_at_seq: Option<u64>,
    /// Bumped by the host on every text change.
    pub version: u64,
}

impl BufferRef {
    pub fn open(id: BufferId, title: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            title: title.into(),
            text: text.into(),
            state: BufferState::Open,
            closed_at_seq: None,
            version: 0,
        }
    }

    pub fn closed(
        id: BufferId,
        title: impl Into<String>,
        text: impl Into<Arc<str>>,
        closed_at_seq: u64,
    ) -> Self {
        Self {
            state: BufferState::Closed,
            closed_at_seq: Some(closed_at_seq),
            ..Self::open(id, title, text)
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.state == BufferState::Closed
    }
}

/// Change notifications the host sends whenever its buffer list mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferEvent {
    Opened(BufferId),
    Edited(BufferId),
    Closed(BufferId),
    Reopened(BufferId),
    Committed(BufferId),
    Evicted(BufferId),
}

impl BufferEvent {
    pub fn buffer_id(&self) -> BufferId {
        match *self {
            Self::Opened(id)
            | Self::Edited(id)
            | Self::Closed(id)
            | Self::Reopened(id)
            | Self::Committed(id)
            | Self::Evicted(id) => id,
        }
    }
}

/// The editor/buffer layer the search core reads from and sends requests to.
pub trait BufferHost {
    /// Open buffers in tab order, plus every retained closed buffer.
    fn list_buffers(&self) -> Vec<BufferRef>;

    /// Bring an open buffer to the front without changing its tab status.
    fn request_activate(&mut self, id: BufferId) -> Result<(), HostError>;

    /// Scroll to and decorate `span` in the buffer.
    fn request_highlight(&mut self, id: BufferId, span: Span) -> Result<(), HostError>;

    fn clear_highlight(&mut self, id: BufferId) -> Result<(), HostError>;

    /// Materialize a closed buffer as the temporary preview tab, replacing any
    /// existing preview.
    fn request_open_preview(&mut self, id: BufferId) -> Result<(), HostError>;

    /// Close the preview tab again without committing it.
    fn request_discard_preview(&mut self, id: BufferId) -> Result<(), HostError>;

    /// Turn the preview tab into a permanent tab.
    fn request_commit(&mut self, id: BufferId) -> Result<(), HostError>;
}

/// Read-only view over the host that fixes ordering and closed-buffer retention.
#[derive(Debug, Clone)]
pub struct BufferCatalog {
    retention: usize,
}

impl Default for BufferCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSED_RETENTION)
    }
}

impl BufferCatalog {
    pub fn new(retention: usize) -> Self {
        Self { retention }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn set_retention(&mut self, retention: usize) {
        self.retention = retention;
    }

    pub fn snapshot<H: BufferHost + ?Sized>(&self, host: &H) -> Vec<BufferRef> {
        self.arrange(host.list_buffers())
    }

    /// Open buffers first in the order given, then closed buffers most recently
    /// closed first, cut off after `retention` closed buffers.
    pub fn arrange(&self, buffers: Vec<BufferRef>) -> Vec<BufferRef> {
        let (mut ordered, mut closed): (Vec<_>, Vec<_>) =
            buffers.into_iter().partition(|buffer| !buffer.is_closed());

        closed.sort_by(|a, b| b.closed_at_seq.cmp(&a.closed_at_seq));
        if closed.len() > self.retention {
            log::trace!(
                "dropping {} closed buffers past retention {}",
                closed.len() - self.retention,
                self.retention
            );
            closed.truncate(self.retention);
        }

        ordered.extend(closed);
        ordered
    }
}

/// Buffers that take part in a search under the given `include_deleted` flag.
pub fn in_scope(snapshot: &[BufferRef], include_deleted: bool) -> impl Iterator<Item = &BufferRef> {
    snapshot
        .iter()
        .filter(move |buffer| include_deleted || !buffer.is_closed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(buffers: &[BufferRef]) -> Vec<u64> {
        buffers.iter().map(|b| b.id.0).collect()
    }

    #[test]
    fn open_buffers_keep_tab_order_and_come_first() {
        let catalog = BufferCatalog::new(10);
        let arranged = catalog.arrange(vec![
            BufferRef::closed(BufferId(1), "a", "", 3),
            BufferRef::open(BufferId(4), "d", ""),
            BufferRef::open(BufferId(2), "b", ""),
            BufferRef::closed(BufferId(3), "c", "", 7),
        ]);

        assert_eq!(ids(&arranged), vec![4, 2, 3, 1]);
    }

    #[test]
    fn oldest_closed_buffers_fall_out_of_scope() {
        let catalog = BufferCatalog::new(2);
        let arranged = catalog.arrange(vec![
            BufferRef::closed(BufferId(1), "a", "", 1),
            BufferRef::closed(BufferId(2), "b", "", 2),
            BufferRef::closed(BufferId(3), "c", "", 3),
            BufferRef::open(BufferId(9), "z", ""),
        ]);

        assert_eq!(ids(&arranged), vec![9, 3, 2]);
    }

    #[test]
    fn zero_retention_hides_every_closed_buffer() {
        let catalog = BufferCatalog::new(0);
        let arranged = catalog.arrange(vec![
            BufferRef::closed(BufferId(1), "a", "", 1),
            BufferRef::open(BufferId(2), "b", ""),
        ]);

        assert_eq!(ids(&arranged), vec![2]);
    }

    #[test]
    fn scope_filter_drops_closed_buffers() {
        let snapshot = vec![
            BufferRef::open(BufferId(1), "a", ""),
            BufferRef::closed(BufferId(2), "b", "", 1),
        ];

        assert_eq!(in_scope(&snapshot, true).count(), 2);
        let open: Vec<_> = in_scope(&snapshot, false).map(|b| b.id).collect();
        assert_eq!(open, vec![BufferId(1)]);
    }

    #[test]
    fn event_exposes_buffer_id() {
        assert_eq!(BufferEvent::Reopened(BufferId(5)).buffer_id(), BufferId(5));
    }
}
