//! Error types and handling infrastructure for rvfs.
//!
//! Every failure the file handle can report is a variant of [`VfsError`]. The
//! status-code surface in [`crate::status`] collapses them to `-1`, while the
//! typed API keeps the message and the underlying `io::Error` for context.
//!
//! ## Design Principles
//!
//! - **One enum per crate**: callers match on a single error type
//! - **Context preservation**: the OS error is kept as the `#[source]`
//! - **Consistency**: standardized Result type across all modules

use crate::file_handler::{AccessMode, Whence};
use thiserror::Error;

/// The main error type for rvfs operations.
#[derive(Error, Debug)]
pub enum VfsError {
    /// The handle could not be opened: encoding, acquisition, or size probe failed
    #[error("Failed to open {path}: {message}")]
    OpenFailed {
        path: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The UTF-8 path has no platform-native representation
    #[error("Cannot encode path {path:?}: {reason}")]
    PathEncoding { path: String, reason: String },

    /// The access mode is reserved and has no backing implementation
    #[error("Access mode {mode:?} is not supported")]
    UnsupportedAccessMode { mode: AccessMode },

    /// Invalid whence/offset combination or OS seek rejection
    #[error("Seek to {offset} from {whence:?} failed: {message}")]
    SeekFailed {
        offset: i64,
        whence: Whence,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Read failed at the OS level or was not permitted by the backend
    #[error("Read failed: {message}")]
    ReadFailed {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Write failed at the OS level or was not permitted by the backend
    #[error("Write failed: {message}")]
    WriteFailed {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Buffered data could not be pushed to the OS
    #[error("Flush failed")]
    FlushFailed {
        #[source]
        source: std::io::Error,
    },

    /// One or more release steps reported an error; all of them still ran
    #[error("Close failed: {message}")]
    CloseFailed {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Operation invoked without a live handle
    #[error("Invalid file handle")]
    InvalidHandle,

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

/// Standard Result type for rvfs operations.
pub type Result<T> = std::result::Result<T, VfsError>;

impl VfsError {
    /// Create an OpenFailed error wrapping the OS error
    pub fn open_failed(
        path: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::OpenFailed {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a SeekFailed error for an offset the cursor arithmetic rejected
    pub fn seek_rejected(offset: i64, whence: Whence, message: impl Into<String>) -> Self {
        Self::SeekFailed {
            offset,
            whence,
            message: message.into(),
            source: None,
        }
    }

    /// Create a SeekFailed error wrapping the OS error
    pub fn seek_failed(offset: i64, whence: Whence, source: std::io::Error) -> Self {
        Self::SeekFailed {
            offset,
            whence,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a ReadFailed error wrapping the OS error
    pub fn read_failed(source: std::io::Error) -> Self {
        Self::ReadFailed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a WriteFailed error with a descriptive message
    pub fn write_rejected(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a WriteFailed error wrapping the OS error
    pub fn write_failed(source: std::io::Error) -> Self {
        Self::WriteFailed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Integer status reported by the status-code surface.
    pub fn status_code(&self) -> i32 {
        -1
    }

    /// Map back to an `io::Error` for the `std::io` trait implementations.
    pub fn into_io_error(self) -> std::io::Error {
        use std::io::{Error, ErrorKind};

        match self {
            Self::OpenFailed {
                source: Some(source),
                ..
            }
            | Self::SeekFailed {
                source: Some(source),
                ..
            }
            | Self::ReadFailed {
                source: Some(source),
                ..
            }
            | Self::WriteFailed {
                source: Some(source),
                ..
            }
            | Self::CloseFailed {
                source: Some(source),
                ..
            }
            | Self::FlushFailed { source } => source,
            other @ (Self::SeekFailed { .. } | Self::PathEncoding { .. }) => {
                Error::new(ErrorKind::InvalidInput, other)
            }
            other @ Self::UnsupportedAccessMode { .. } => Error::new(ErrorKind::Unsupported, other),
            other @ Self::WriteFailed { .. } => Error::new(ErrorKind::PermissionDenied, other),
            other => Error::new(ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_error_display_messages() {
        let open = VfsError::open_failed(
            "/test/file.bin",
            "Failed to open stream",
            std::io::Error::new(ErrorKind::NotFound, "missing"),
        );
        assert_eq!(
            open.to_string(),
            "Failed to open /test/file.bin: Failed to open stream"
        );

        let seek = VfsError::seek_rejected(-1, Whence::Set, "negative offset");
        assert_eq!(
            seek.to_string(),
            "Seek to -1 from Set failed: negative offset"
        );

        assert_eq!(VfsError::InvalidHandle.to_string(), "Invalid file handle");
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error;

        let err = VfsError::read_failed(std::io::Error::new(ErrorKind::Interrupted, "eintr"));
        assert!(err.source().is_some());

        let err = VfsError::write_rejected("mapped handles are read-only");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_status_code_is_negative_one() {
        assert_eq!(VfsError::InvalidHandle.status_code(), -1);
        assert_eq!(VfsError::config("bad").status_code(), -1);
    }

    #[test]
    fn test_into_io_error_keeps_os_kind() {
        let err = VfsError::seek_failed(
            4,
            Whence::Cur,
            std::io::Error::new(ErrorKind::InvalidInput, "einval"),
        );
        assert_eq!(err.into_io_error().kind(), ErrorKind::InvalidInput);

        let err = VfsError::write_rejected("read-only mapping");
        assert_eq!(err.into_io_error().kind(), ErrorKind::PermissionDenied);

        let err = VfsError::UnsupportedAccessMode {
            mode: AccessMode::UpdateExisting,
        };
        assert_eq!(err.into_io_error().kind(), ErrorKind::Unsupported);
    }
}
