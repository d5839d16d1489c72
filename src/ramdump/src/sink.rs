//! Dump output sink.
//!
//! The [`SinkWriter`] owns the output stream for one acquisition session and
//! tracks the output cursor. Every chunk lands at the cursor, which only
//! advances by bytes the sink accepted.

use crate::error::{AcquireError, Result};
use std::fs::{File, OpenOptions, Permissions};
use std::io;
use std::os::unix::fs::{FileExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Owner-only read/write
pub const OUTPUT_MODE: u32 = 0o600;

/// Positional byte sink backing a [`SinkWriter`]
pub trait Sink {
    /// Write `buf` at `offset`, returning how many bytes were accepted
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize>;

    /// Flush written data to durable storage
    fn sync(&mut self) -> io::Result<()>;
}

/// File-backed sink
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    /// Create or truncate `path` with mode 0600
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(OUTPUT_MODE)
            .open(path)?;

        // mode() only applies when the file is created; an existing dump may
        // have looser permissions
        file.set_permissions(Permissions::from_mode(OUTPUT_MODE))?;

        Ok(FileSink { file })
    }
}

impl Sink for FileSink {
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        loop {
            match FileExt::write_at(&self.file, buf, offset) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => return result,
            }
        }
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

/// Output stream plus cursor for one acquisition session
#[derive(Debug)]
pub struct SinkWriter<S: Sink = FileSink> {
    sink: S,
    cursor: u64,
    /// Path the output was opened at, if file-backed
    pub path: Option<PathBuf>,
}

impl SinkWriter<FileSink> {
    /// Create or truncate the output file and reset the cursor
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sink = FileSink::create(&path).map_err(|source| AcquireError::Open {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(output = %path.display(), "opened dump output");

        Ok(SinkWriter {
            sink,
            cursor: 0,
            path: Some(path),
        })
    }
}

impl<S: Sink> SinkWriter<S> {
    /// Wrap an already-open sink; the cursor starts at zero
    pub fn with_sink(sink: S) -> Self {
        SinkWriter {
            sink,
            cursor: 0,
            path: None,
        }
    }

    /// Bytes written so far
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Write `bytes` at the cursor with a single sink call
    ///
    /// The cursor advances by whatever the sink accepted. Accepting fewer
    /// bytes than requested is reported as [`AcquireError::ShortWrite`].
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let offset = self.cursor;
        let written = self
            .sink
            .write_at(bytes, offset)
            .map_err(|source| AcquireError::Write { offset, source })?;

        self.cursor += written as u64;

        if written != bytes.len() {
            return Err(AcquireError::ShortWrite {
                offset,
                written,
                requested: bytes.len(),
            });
        }

        Ok(written)
    }

    /// Flush and release the output, returning the sink
    pub fn close(mut self) -> Result<S> {
        self.sink.sync().map_err(AcquireError::Close)?;
        tracing::debug!(bytes = self.cursor, "closed dump output");
        Ok(self.sink)
    }
}
