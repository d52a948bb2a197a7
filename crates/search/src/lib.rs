//! Multi-buffer search for QueryDesk editor tabs.

mod catalog;
mod engine;
mod error;
mod line_index;
mod pattern;
mod results;
mod selection;
mod state;

pub use catalog::{
    BufferCatalog, BufferEvent, BufferHost, BufferId, BufferRef, BufferState,
    DEFAULT_CLOSED_RETENTION, in_scope,
};
pub use engine::{DEFAULT_MAX_MATCHES, SearchConfig, SearchEngine, search};
pub use error::{CompileError, HostError};
pub use line_index::{LineIndex, LineIndexCache, Position};
pub use pattern::{Matcher, SearchOption, SearchOptions, Span, compile, escape_literal};
pub use results::{
    Direction, Match, MatchPreview, Navigator, ResultGroup, ResultRef, ResultSet, ResultStatus,
    Target, TitleMatch, flatten,
};
pub use selection::{Activation, ClickKind, SelectionBridge};
pub use state::{ControllerConfig, ControllerState, DEFAULT_DEBOUNCE, SearchController};
