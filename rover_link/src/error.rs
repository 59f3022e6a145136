use thiserror::Error;

/// Transport-layer failures from the device or policy endpoints.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("unexpected status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for LinkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LinkError::Timeout
        } else {
            LinkError::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
