//! Chunked physical memory copier.
//!
//! Walks each range in chunk-sized windows: map the window, copy it into the
//! staging buffer, release the mapping, then hand the staged bytes to the
//! [`SinkWriter`]. Windows that cannot be mapped are skipped and recorded;
//! any output failure ends the copy.

use crate::error::{AcquireError, Result};
use crate::sink::{Sink, SinkWriter};
use crate::source::{MemoryRange, PhysicalMemory};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;

/// What to write in place of a window that could not be mapped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Omit the window; later bytes shift down in the output
    #[default]
    Skip,
    /// Write zeros of the window's size so output offsets stay positional
    ZeroFill,
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapPolicy::Skip => write!(f, "skip"),
            GapPolicy::ZeroFill => write!(f, "zero-fill"),
        }
    }
}

impl FromStr for GapPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "skip" => Ok(GapPolicy::Skip),
            "zero-fill" | "zero" => Ok(GapPolicy::ZeroFill),
            other => Err(format!(
                "unknown gap policy '{}' (expected 'skip' or 'zero-fill')",
                other
            )),
        }
    }
}

/// A window that could not be mapped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedWindow {
    pub start: u64,
    pub len: usize,
    pub reason: String,
}

/// Counters accumulated over one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    /// Ranges started
    pub ranges: u64,
    /// Mapping attempts, one per window
    pub windows: u64,
    /// Windows copied from physical memory and written
    pub chunks_written: u64,
    /// Bytes written, including zero fill
    pub bytes_written: u64,
    /// Bytes written as zero fill for skipped windows
    pub zero_filled: u64,
    pub skipped: Vec<SkippedWindow>,
}

/// Drives map/copy/write over ranges through one reusable staging buffer
pub struct ChunkedCopier<'m, M: PhysicalMemory> {
    memory: &'m M,
    staging: Vec<u8>,
    gap_policy: GapPolicy,
    stats: CopyStats,
}

impl<'m, M: PhysicalMemory> ChunkedCopier<'m, M> {
    /// Allocate the staging buffer for `chunk_size` byte windows
    pub fn new(memory: &'m M, chunk_size: usize, gap_policy: GapPolicy) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AcquireError::InvalidConfig(
                "chunk size must be non-zero".to_string(),
            ));
        }

        let mut staging = Vec::new();
        staging
            .try_reserve_exact(chunk_size)
            .map_err(|_| AcquireError::NoMemory(chunk_size))?;
        staging.resize(chunk_size, 0);

        Ok(ChunkedCopier {
            memory,
            staging,
            gap_policy,
            stats: CopyStats::default(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.staging.len()
    }

    pub fn stats(&self) -> &CopyStats {
        &self.stats
    }

    pub fn into_stats(self) -> CopyStats {
        self.stats
    }

    /// Copy every window of `range` into `writer`
    ///
    /// Mapping failures are recorded and skipped. The first write failure is
    /// returned and no further windows are attempted.
    pub fn copy_range<S: Sink>(
        &mut self,
        range: MemoryRange,
        writer: &mut SinkWriter<S>,
    ) -> Result<()> {
        self.stats.ranges += 1;
        tracing::info!(
            start = format_args!("{:#x}", range.start),
            end = format_args!("{:#x}", range.end),
            size = range.size(),
            "acquiring range"
        );

        for (start, len) in range.windows(self.chunk_size()) {
            self.stats.windows += 1;

            match self.stage(start, len) {
                Ok(()) => {
                    self.write_staged(len, writer)?;
                    self.stats.chunks_written += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        start = format_args!("{:#x}", start),
                        len,
                        error = %err,
                        "failed to map window, skipping"
                    );
                    self.stats.skipped.push(SkippedWindow {
                        start,
                        len,
                        reason: err.to_string(),
                    });

                    if self.gap_policy == GapPolicy::ZeroFill {
                        self.staging[..len].fill(0);
                        self.write_staged(len, writer)?;
                        self.stats.zero_filled += len as u64;
                    }
                }
            }
        }

        Ok(())
    }

    /// Copy ranges in order, stopping at the first fatal error
    pub fn copy_ranges<S, I>(&mut self, ranges: I, writer: &mut SinkWriter<S>) -> Result<()>
    where
        S: Sink,
        I: IntoIterator<Item = MemoryRange>,
    {
        for range in ranges {
            self.copy_range(range, writer)?;
        }
        Ok(())
    }

    /// Map one window and copy it into the staging buffer
    ///
    /// The mapping is dropped before this returns, on success or failure.
    fn stage(&mut self, start: u64, len: usize) -> io::Result<()> {
        let window = self.memory.map(start, len)?;
        if window.len() < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("mapped {} of {} bytes", window.len(), len),
            ));
        }
        self.staging[..len].copy_from_slice(&window[..len]);
        Ok(())
    }

    fn write_staged<S: Sink>(&mut self, len: usize, writer: &mut SinkWriter<S>) -> Result<()> {
        match writer.write(&self.staging[..len]) {
            Ok(written) => {
                self.stats.bytes_written += written as u64;
                Ok(())
            }
            Err(err) => {
                if let AcquireError::ShortWrite { written, .. } = &err {
                    self.stats.bytes_written += *written as u64;
                }
                tracing::error!(error = %err, "failed to write chunk, aborting");
                Err(err)
            }
        }
    }
}
