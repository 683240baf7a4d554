//! Error taxonomy for the datasource core.
//!
//! Three failure families, split by where in the pipeline things go wrong:
//! the request never produced a response ([`DatasourceError::Network`]), the
//! backend answered but rejected the request
//! ([`DatasourceError::Transport`]), or the response body decoded but could
//! not be shaped into a frame ([`DatasourceError::Mapping`]).

use serde::Deserialize;
use thiserror::Error;

/// Structured error record some backend responses carry as
/// `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasourceError {
    /// No response reached us at all (DNS failure, refused connection, ...).
    #[error("connection failed: {0}")]
    Network(String),

    /// The backend answered with a non-success status, or with a body that
    /// was not readable as JSON.
    #[error("backend returned HTTP {status} {status_text}")]
    Transport {
        status: u16,
        status_text: String,
        body: Option<ErrorBody>,
    },

    /// The payload decoded as JSON, but not into a known series shape.
    #[error("payload mapping failed: {0}")]
    Mapping(#[from] MapError),
}

/// Failures turning a decoded payload into a time-series frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("payload matches no supported series schema")]
    UnknownShape,
    #[error("legacy payload contains no series record")]
    EmptyPayload,
    #[error("Ts/Val length mismatch: {ts} != {val}")]
    LengthMismatch { ts: usize, val: usize },
}
