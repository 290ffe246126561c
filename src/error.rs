//! Pipeline error taxonomy
//!
//! Deep code reports the kind of failure; the caller decides what to do
//! with it. Connectivity and read failures are fatal to the process,
//! per-batch write failures are logged and the batch is dropped.

use thiserror::Error;

/// Errors produced by the transfer pipeline
#[derive(Debug, Error)]
pub enum RelayError {
    /// Could not establish the source connection at startup
    #[error("could not connect to source at {endpoint}: {reason}")]
    SourceConnect { endpoint: String, reason: String },
    /// A stream read failed after a successful initial connection
    #[error("stream read failed: {0}")]
    SourceRead(String),
    /// Could not establish the destination connection at startup
    #[error("could not connect to sink at {endpoint}: {reason}")]
    SinkConnect { endpoint: String, reason: String },
    /// A pipelined write for one batch failed
    #[error("pipelined write failed: {0}")]
    SinkWrite(String),
}

impl RelayError {
    /// Whether this error should terminate the process.
    ///
    /// Write failures are non-fatal: the batch is dropped and the
    /// pipeline keeps running (best-effort delivery).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RelayError::SinkWrite(_))
    }
}
