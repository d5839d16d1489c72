//! Error types for acquisition sessions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end an acquisition session.
///
/// Recoverable mapping failures never appear here; they are recorded as
/// [`crate::SkippedWindow`]s in the session report instead.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read resource registry {path}: {source}")]
    Registry { path: PathBuf, source: io::Error },

    #[error("Failed to open physical memory device {path}: {source}")]
    Device { path: PathBuf, source: io::Error },

    #[error("Failed to create output {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Failed to allocate {0} byte staging buffer")]
    NoMemory(usize),

    #[error("Short write at offset {offset:#x}: wrote {written} of {requested} bytes")]
    ShortWrite {
        offset: u64,
        written: usize,
        requested: usize,
    },

    #[error("Write failed at offset {offset:#x}: {source}")]
    Write { offset: u64, source: io::Error },

    #[error("Failed to close output: {0}")]
    Close(io::Error),
}

impl AcquireError {
    /// Completion code reported to the trigger, as a positive errno value.
    ///
    /// Open failures surface the underlying OS error so the caller sees why
    /// the path could not be created.
    pub fn code(&self) -> i32 {
        match self {
            AcquireError::InvalidConfig(_) => libc::EINVAL,
            AcquireError::Registry { source, .. }
            | AcquireError::Device { source, .. }
            | AcquireError::Open { source, .. } => source.raw_os_error().unwrap_or(libc::EIO),
            AcquireError::NoMemory(_) => libc::ENOMEM,
            AcquireError::ShortWrite { .. } | AcquireError::Write { .. } | AcquireError::Close(_) => {
                libc::EIO
            }
        }
    }

    /// Whether the error happened before any range was touched.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            AcquireError::InvalidConfig(_)
                | AcquireError::Registry { .. }
                | AcquireError::Device { .. }
                | AcquireError::Open { .. }
                | AcquireError::NoMemory(_)
        )
    }
}

/// Result type for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_memory_code() {
        let err = AcquireError::NoMemory(4096);
        assert_eq!(err.code(), libc::ENOMEM);
        assert!(err.is_setup());
    }

    #[test]
    fn test_write_failures_map_to_eio() {
        let short = AcquireError::ShortWrite {
            offset: 0x1000,
            written: 10,
            requested: 4096,
        };
        assert_eq!(short.code(), libc::EIO);
        assert!(!short.is_setup());
        assert!(short.to_string().contains("0x1000"));
        assert!(short.to_string().contains("10 of 4096"));

        let fault = AcquireError::Write {
            offset: 0,
            source: io::Error::new(io::ErrorKind::Other, "disk gone"),
        };
        assert_eq!(fault.code(), libc::EIO);
    }

    #[test]
    fn test_open_failure_keeps_os_code() {
        let err = AcquireError::Open {
            path: PathBuf::from("/nonexistent/ram.raw"),
            source: io::Error::from_raw_os_error(libc::ENOENT),
        };
        assert_eq!(err.code(), libc::ENOENT);
        assert!(err.to_string().contains("/nonexistent/ram.raw"));
    }

    #[test]
    fn test_open_failure_without_os_code() {
        let err = AcquireError::Open {
            path: PathBuf::from("ram.raw"),
            source: io::Error::new(io::ErrorKind::Other, "synthetic"),
        };
        assert_eq!(err.code(), libc::EIO);
    }
}
