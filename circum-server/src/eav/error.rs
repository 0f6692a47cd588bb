//! Remote adapter error types.

use std::fmt;

/// Errors from the upstream planner adapter.
#[derive(Debug)]
pub enum EavError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// Upstream returned a non-success status
    Upstream { status: u16, body: String },

    /// Response body was not in an expected shape
    Parse { message: String },

    /// Upstream answered with an error payload instead of data
    Rejected(String),

    /// Station id not in the registry
    UnknownStation(String),

    /// Malformed request parameter
    InvalidRequest(String),

    /// Remote adapter not configured
    NotConfigured(String),
}

impl EavError {
    /// Whether the caller, not the upstream, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EavError::UnknownStation(_) | EavError::InvalidRequest(_)
        )
    }
}

impl fmt::Display for EavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EavError::Http(e) => write!(f, "HTTP error: {e}"),
            EavError::Upstream { status, body } => {
                write!(f, "upstream error {status}")?;
                if !body.is_empty() {
                    write!(f, ": {body}")?;
                }
                Ok(())
            }
            EavError::Parse { message } => write!(f, "could not parse upstream response: {message}"),
            EavError::Rejected(msg) => write!(f, "upstream rejected request: {msg}"),
            EavError::UnknownStation(id) => write!(f, "unknown station id: {id}"),
            EavError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            EavError::NotConfigured(msg) => write!(f, "not configured: {msg}"),
        }
    }
}

impl std::error::Error for EavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EavError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EavError {
    fn from(err: reqwest::Error) -> Self {
        EavError::Http(err)
    }
}
