//! Stream error types.

/// Errors that terminate an event stream.
///
/// Errors returned from closing a stream are plain [`std::io::Error`]s and
/// never show up here.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// Reading from the underlying source failed.
    #[error("Failed to read event stream: {0}")]
    Read(#[from] std::io::Error),

    /// A single line did not fit into the line buffer.
    #[error("Event line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    /// A non-empty line was not a valid record.
    #[error("Failed to decode event: {0}")]
    Decode(#[from] serde_json::Error),
}
