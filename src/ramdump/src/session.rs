//! Acquisition sessions.
//!
//! A session is one end-to-end run: open the output, enumerate usable RAM,
//! copy every range through the chunked copier, and close the output on
//! every exit path.

use crate::copier::{ChunkedCopier, CopyStats, GapPolicy, SkippedWindow};
use crate::error::{AcquireError, Result};
use crate::registry::{IomemRegistry, ResourceRegistry, DEFAULT_IOMEM, SYSTEM_RAM_LABEL};
use crate::sink::{Sink, SinkWriter};
use crate::source::{DevMem, PhysicalMemory, DEFAULT_DEVICE};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Default chunk size (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Largest accepted chunk size (1 GiB)
pub const MAX_CHUNK_SIZE: usize = 1 << 30;

/// Parameters for one acquisition session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Dump file, truncated on every session
    pub output: PathBuf,
    /// Bytes per mapping window and size of the staging buffer
    pub chunk_size: usize,
    /// Registry label of ranges to acquire
    pub label: String,
    pub gap_policy: GapPolicy,
    /// Physical memory device
    pub device: PathBuf,
    /// Resource registry listing
    pub registry: PathBuf,
}

impl AcquireConfig {
    /// Defaults for everything except the output path
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        AcquireConfig {
            output: output.as_ref().to_path_buf(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            label: SYSTEM_RAM_LABEL.to_string(),
            gap_policy: GapPolicy::default(),
            device: PathBuf::from(DEFAULT_DEVICE),
            registry: PathBuf::from(DEFAULT_IOMEM),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    pub fn with_device<P: AsRef<Path>>(mut self, device: P) -> Self {
        self.device = device.as_ref().to_path_buf();
        self
    }

    pub fn with_registry<P: AsRef<Path>>(mut self, registry: P) -> Self {
        self.registry = registry.as_ref().to_path_buf();
        self
    }

    /// Check the configuration once, before anything is opened
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(AcquireError::InvalidConfig(
                "chunk size must be non-zero".to_string(),
            ));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(AcquireError::InvalidConfig(format!(
                "chunk size {:#x} exceeds maximum {:#x}",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        if self.label.trim().is_empty() {
            return Err(AcquireError::InvalidConfig(
                "range label must not be empty".to_string(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(AcquireError::InvalidConfig(
                "output path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a completed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionReport {
    pub output: Option<PathBuf>,
    pub label: String,
    pub chunk_size: usize,
    pub gap_policy: GapPolicy,
    /// Ranges acquired
    pub ranges: u64,
    /// Mapping attempts
    pub windows: u64,
    pub chunks_written: u64,
    pub bytes_written: u64,
    pub zero_filled: u64,
    pub skipped: Vec<SkippedWindow>,
    pub elapsed_ms: u64,
}

impl AcquisitionReport {
    fn from_stats(
        config: &AcquireConfig,
        output: Option<PathBuf>,
        stats: CopyStats,
        elapsed_ms: u64,
    ) -> Self {
        AcquisitionReport {
            output,
            label: config.label.clone(),
            chunk_size: config.chunk_size,
            gap_policy: config.gap_policy,
            ranges: stats.ranges,
            windows: stats.windows,
            chunks_written: stats.chunks_written,
            bytes_written: stats.bytes_written,
            zero_filled: stats.zero_filled,
            skipped: stats.skipped,
            elapsed_ms,
        }
    }

    /// Bytes of physical memory that could not be mapped
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped.iter().map(|s| s.len as u64).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One acquisition run over a registry and a physical memory source
pub struct AcquisitionSession<R: ResourceRegistry = IomemRegistry, M: PhysicalMemory = DevMem> {
    config: AcquireConfig,
    registry: R,
    memory: M,
}

impl AcquisitionSession<IomemRegistry, DevMem> {
    /// Validate `config` and open the configured registry and device
    pub fn new(config: AcquireConfig) -> Result<Self> {
        config.validate()?;
        let registry = IomemRegistry::new(&config.registry);
        let memory = DevMem::open(&config.device)?;
        Ok(AcquisitionSession {
            config,
            registry,
            memory,
        })
    }
}

impl<R: ResourceRegistry, M: PhysicalMemory> AcquisitionSession<R, M> {
    /// Build a session over an explicit registry and memory source
    pub fn with_parts(config: AcquireConfig, registry: R, memory: M) -> Result<Self> {
        config.validate()?;
        Ok(AcquisitionSession {
            config,
            registry,
            memory,
        })
    }

    /// Run the session against the configured output file
    ///
    /// The output is created (or truncated) first; if that fails nothing else
    /// happens.
    pub fn run(&self) -> Result<AcquisitionReport> {
        let writer = SinkWriter::open(&self.config.output)?;
        self.run_with(writer)
    }

    /// Run the session into an already-open writer, closing it before returning
    pub fn run_with<S: Sink>(&self, mut writer: SinkWriter<S>) -> Result<AcquisitionReport> {
        let started = Instant::now();
        let output = writer.path.clone();

        let outcome = self.acquire(&mut writer);
        let closed = writer.close();

        let stats = match (outcome, closed) {
            (Ok(stats), Ok(_)) => stats,
            (Ok(_), Err(close_err)) => return Err(close_err),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    tracing::error!(error = %close_err, "failed to close output after error");
                }
                return Err(err);
            }
        };

        let report = AcquisitionReport::from_stats(
            &self.config,
            output,
            stats,
            started.elapsed().as_millis() as u64,
        );

        tracing::info!(
            ranges = report.ranges,
            bytes = report.bytes_written,
            skipped = report.skipped.len(),
            "acquisition complete"
        );

        Ok(report)
    }

    fn acquire<S: Sink>(&self, writer: &mut SinkWriter<S>) -> Result<CopyStats> {
        let mut copier =
            ChunkedCopier::new(&self.memory, self.config.chunk_size, self.config.gap_policy)?;

        let root = self.registry.snapshot()?;
        copier.copy_ranges(root.ranges_labeled(&self.config.label), writer)?;

        Ok(copier.into_stats())
    }
}
