use thiserror::Error;

/// Why one attempt against one node failed. Every variant is retryable;
/// none of them escapes a search operation.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("no response within {0}ms")]
    Timeout(u128),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for AttemptError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AttemptError::MalformedBody(e.to_string())
        } else {
            AttemptError::Transport(e.to_string())
        }
    }
}
