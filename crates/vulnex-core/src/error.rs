//! Common error type for chunk download and parsing

use crate::stream::StreamError;

/// Error from retrieving a single export chunk (download + parse).
///
/// Wraps either a network/HTTP error ([`StreamError`]) or a local I/O error.
#[derive(Debug)]
pub enum ChunkError {
    Stream(StreamError),
    Io(std::io::Error),
}

impl std::fmt::Display for ChunkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for ChunkError {}

impl From<StreamError> for ChunkError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl From<std::io::Error> for ChunkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl ChunkError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Stream(e) => e.is_retryable(),
            Self::Io(e) => e.kind() != std::io::ErrorKind::StorageFull,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    fn http_err(status: u16) -> StreamError {
        StreamError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn chunk_error_stream_403_not_retryable() {
        let err = ChunkError::Stream(http_err(403));
        assert!(!err.is_retryable());
    }

    #[test]
    fn chunk_error_stream_500_retryable() {
        let err = ChunkError::Stream(http_err(500));
        assert!(err.is_retryable());
    }

    #[test]
    fn chunk_error_io_storage_full_not_retryable() {
        let err = ChunkError::Io(std::io::Error::new(ErrorKind::StorageFull, "disk full"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn chunk_error_io_other_retryable() {
        let err = ChunkError::Io(std::io::Error::new(ErrorKind::BrokenPipe, "pipe"));
        assert!(err.is_retryable());
    }

    #[test]
    fn chunk_error_display_io() {
        let err = ChunkError::Io(std::io::Error::new(ErrorKind::NotFound, "not found"));
        let msg = format!("{err}");
        assert!(msg.contains("IO:"));
    }
}
