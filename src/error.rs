//! Load failure taxonomy.
//!
//! Only structural failures are errors. A body line that fails field
//! extraction is skipped by the tokenizer and never reaches this type.

use std::io;
use thiserror::Error;

/// Errors that abort a point-cloud load.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The stream ended before the header terminator was seen.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The byte source could not be opened or read.
    #[error("Unreadable stream: {0}")]
    UnreadableStream(#[from] io::Error),

    /// The background worker panicked, disconnected, or could not start.
    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    #[error("Load cancelled")]
    Cancelled,

    /// No format could be chosen for the named resource.
    #[error("Unknown point cloud format: {0}")]
    UnknownFormat(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl LoadError {
    /// True for a load that stopped because cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_surfaces_verbatim() {
        let err: LoadError = io::Error::new(io::ErrorKind::NotFound, "no such file").into();
        assert_eq!(err.to_string(), "Unreadable stream: no such file");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled() {
        assert!(LoadError::Cancelled.is_cancelled());
        assert_eq!(LoadError::Cancelled.to_string(), "Load cancelled");
    }
}
