//! Error types for tile serving

use crate::http::{self, response::RESOLUTION_FAILED_BODY, TileResponse};
use thiserror::Error;

/// Result type alias for tile operations
pub type Result<T> = std::result::Result<T, TileError>;

/// Per-request failures; every variant maps to a response, none is fatal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileError {
    #[error("Range cannot be satisfied against {total} bytes")]
    Malformed { total: u64 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("No dated build found in the lookback window")]
    ResolutionFailed,

    #[error("Origin returned status {status}")]
    Origin { status: u16 },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl From<std::io::Error> for TileError {
    fn from(err: std::io::Error) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for TileError {
    fn from(err: serde_json::Error) -> Self {
        Self::Cache(format!("metadata: {err}"))
    }
}

impl From<reqwest::Error> for TileError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl TileError {
    /// HTTP status code sent to the client for this error
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Malformed { .. } => 416,
            Self::NotFound(_) => 404,
            Self::Origin { status } => *status,
            Self::ResolutionFailed | Self::Transport(_) | Self::Cache(_) => 502,
        }
    }

    /// Convert the error into the response sent to the client
    pub fn into_response(self) -> TileResponse {
        let status = self.status_code();
        match self {
            Self::Malformed { total } => http::build_416_response(total),
            Self::NotFound(_) => http::build_404_response(),
            Self::ResolutionFailed => http::build_502_response(Some(RESOLUTION_FAILED_BODY)),
            Self::Origin { .. } => http::build_status_response(status),
            Self::Transport(_) | Self::Cache(_) => http::build_502_response(None),
        }
    }
}
