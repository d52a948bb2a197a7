use crate::catalog::BufferId;

/// Failure to turn a query into a matcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Nothing to search for. Callers treat this as "no search active".
    #[error("empty query")]
    EmptyQuery,
    /// The query is not a valid regular expression.
    #[error("{message}")]
    RegexSyntax { message: String },
}

impl CompileError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the error should be shown to the user at all.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::EmptyQuery)
    }
}

/// Failure reported by the buffer host while acting on a search result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("buffer {0} not found")]
    NotFound(BufferId),
    #[error("result entry is no longer part of the result set")]
    StaleResult,
}
