use crate::catalog::{BufferEvent, BufferHost, BufferId};
use crate::error::HostError;
use crate::pattern::Span;
use crate::results::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

/// What a clicked result points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub buffer_id: BufferId,
    pub is_closed: bool,
    /// `None` for header entries, which activate the buffer without a highlight.
    pub span: Option<Span>,
}

impl From<Target<'_>> for Activation {
    fn from(target: Target<'_>) -> Self {
        let group = target.group();
        Self {
            buffer_id: group.buffer_id,
            is_closed: group.is_closed,
            span: target.span(),
        }
    }
}

/// Turns clicks on results into requests against the buffer host, and tracks
/// the single buffer currently open as a preview.
#[derive(Debug, Default)]
pub struct SelectionBridge {
    preview: Option<BufferId>,
}

impl SelectionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preview(&self) -> Option<BufferId> {
        self.preview
    }

    /// Applies a click. Host failures leave the result list alone and are only
    /// logged.
    pub fn activate<H: BufferHost + ?Sized>(
        &mut self,
        host: &mut H,
        activation: Activation,
        click: ClickKind,
    ) -> bool {
        match self.try_activate(host, activation, click) {
            Ok(()) => true,
            Err(error) => {
                log::debug!("ignoring activation of buffer {}: {error}", activation.buffer_id);
                false
            }
        }
    }

    pub fn try_activate<H: BufferHost + ?Sized>(
        &mut self,
        host: &mut H,
        activation: Activation,
        click: ClickKind,
    ) -> Result<(), HostError> {
        let id = activation.buffer_id;
        self.bring_forward(host, activation)?;

        match click {
            ClickKind::Single => {
                if let Some(span) = activation.span {
                    host.request_highlight(id, span)?;
                }
            }
            ClickKind::Double => {
                if self.preview == Some(id) {
                    host.request_commit(id)?;
                    self.preview = None;
                }
                host.clear_highlight(id)?;
            }
        }

        Ok(())
    }

    /// Drops preview tracking once the host commits, closes or forgets the tab.
    pub fn observe(&mut self, event: &BufferEvent) {
        match *event {
            BufferEvent::Committed(id) | BufferEvent::Closed(id) | BufferEvent::Evicted(id)
                if self.preview == Some(id) =>
            {
                log::trace!("preview {id} settled by {event:?}");
                self.preview = None;
            }
            _ => {}
        }
    }

    fn bring_forward<H: BufferHost + ?Sized>(
        &mut self,
        host: &mut H,
        activation: Activation,
    ) -> Result<(), HostError> {
        let id = activation.buffer_id;
        if self.preview == Some(id) {
            return host.request_activate(id);
        }

        if activation.is_closed {
            // the host re-closes whatever preview it had before
            host.request_open_preview(id)?;
            self.preview = Some(id);
            return Ok(());
        }

        // an open buffer is only brought to front; any preview tab stays
        host.request_activate(id)
    }
}
