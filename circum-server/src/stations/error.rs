//! Station resolver error types.

/// Errors from resolving a free-text station query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The query was empty or only whitespace
    #[error("station query must not be empty")]
    EmptyQuery,
}
