//! Error types for gridsweep.

use gridsweep_types::rect::RectangleError;
use thiserror::Error;

/// Fatal errors: anything that prevents a sweep from starting.
///
/// A sweep that has started never fails as a whole; per-rectangle problems
/// are reported as [`FetchError`]s inside the
/// [`SearchOutcome`](crate::outcome::SearchOutcome).
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] RectangleError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;

/// A recoverable failure while fetching one page of one rectangle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether repeating the same page request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status } => *status == 429 || (500..600).contains(status),
            FetchError::Transport(_) | FetchError::Timeout => true,
            FetchError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}
