use std::path::PathBuf;

use querydesk_search::BufferId;

/// Errors from tab operations and session files.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot open more than {limit} tabs")]
    TabLimit { limit: usize },

    #[error("tab {0} not found")]
    NotFound(BufferId),

    #[error("tab position {0} is out of range")]
    InvalidPosition(usize),
}
