//! Acquire command handler
//!
//! The trigger for one acquisition session: resolve settings, serialize
//! against other sessions, run, and report.

use crate::cli::AcquireArgs;
use crate::config::Config;
use anyhow::{Context, Result};
use ramdump::{AcquireConfig, AcquireError, AcquisitionReport, AcquisitionSession};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Another session already holds the lock for this output
#[derive(Debug, thiserror::Error)]
#[error("Another acquisition is already writing {0}")]
pub struct SessionBusy(pub PathBuf);

/// Handle the acquire command
pub fn handle(args: &AcquireArgs) -> Result<()> {
    let config = resolve_config(args, &Config::load()?)?;
    let _lock = SessionLock::acquire(&config.output)?;

    let report = AcquisitionSession::new(config.clone())
        .context("Failed to start acquisition")?
        .run()
        .with_context(|| format!("Acquisition into {} failed", config.output.display()))?;

    print_summary(&report, &config.output);

    if let Some(report_path) = &args.report {
        let json = report.to_json().context("Failed to serialize report")?;
        std::fs::write(report_path, json)
            .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
        println!("Report written to {}", report_path.display());
    }

    Ok(())
}

/// Merge flags over saved configuration over built-in defaults
pub fn resolve_config(args: &AcquireArgs, saved: &Config) -> Result<AcquireConfig> {
    let output = args
        .output
        .clone()
        .or_else(|| saved.output.clone())
        .context("No output path. Pass --output or run `ramdump configure --output <PATH>`")?;

    let mut config = AcquireConfig::new(output);

    if let Some(chunk_size) = args.chunk_size.or(saved.chunk_size) {
        config = config.with_chunk_size(chunk_size);
    }
    if let Some(label) = args.label.clone().or_else(|| saved.label.clone()) {
        config = config.with_label(label);
    }
    if let Some(policy) = args.gap_policy.map(Into::into).or(saved.gap_policy) {
        config = config.with_gap_policy(policy);
    }
    if let Some(device) = args.device.as_ref().or(saved.device.as_ref()) {
        config = config.with_device(device);
    }
    if let Some(iomem) = args.iomem.as_ref().or(saved.iomem.as_ref()) {
        config = config.with_registry(iomem);
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(report: &AcquisitionReport, output: &Path) {
    println!(
        "Acquired {} bytes from {} ranges into {} ({} ms)",
        report.bytes_written,
        report.ranges,
        output.display(),
        report.elapsed_ms
    );

    if !report.skipped.is_empty() {
        println!(
            "  {} windows ({} bytes) could not be mapped ({})",
            report.skipped.len(),
            report.skipped_bytes(),
            report.gap_policy
        );
    }
}

/// Exclusive advisory lock serializing sessions on one output
///
/// Held on `<output>.lock`, which stays next to the output after the session.
struct SessionLock {
    _file: File,
}

impl SessionLock {
    fn acquire(output: &Path) -> Result<Self> {
        let path = lock_path(output);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(&path)
            .map_err(|source| AcquireError::Open {
                path: output.to_path_buf(),
                source,
            })?;

        // SAFETY: flock only reads the descriptor, which `file` keeps open
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                return Err(SessionBusy(output.to_path_buf()).into());
            }
            return Err(err).with_context(|| format!("Failed to lock {}", path.display()));
        }

        tracing::debug!(lock = %path.display(), "acquired session lock");
        Ok(SessionLock { _file: file })
    }
}

fn lock_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}
