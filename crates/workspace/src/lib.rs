//! In-process editor tabs for QueryDesk: the buffer host the search core
//! talks to, session files and the text rendering of the results panel.

mod error;
mod panel;
mod session;
mod workspace;

pub use error::SessionError;
pub use panel::render_panel;
pub use session::{Session, SessionTab};
pub use workspace::{Buffer, DEFAULT_MAX_TABS, TabKind, Workspace};
