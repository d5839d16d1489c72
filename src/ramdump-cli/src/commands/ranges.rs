//! Ranges command handler
//!
//! Lists the ranges an acquisition would copy without touching physical memory.

use crate::config::Config;
use anyhow::{Context, Result};
use ramdump::{
    IomemRegistry, MemoryRange, ResourceRegistry, DEFAULT_CHUNK_SIZE, DEFAULT_IOMEM,
    SYSTEM_RAM_LABEL,
};
use std::path::PathBuf;

/// Handle the ranges command
pub fn handle(
    label: Option<String>,
    iomem: Option<PathBuf>,
    chunk_size: Option<usize>,
) -> Result<()> {
    let saved = Config::load()?;

    let label = label
        .or(saved.label)
        .unwrap_or_else(|| SYSTEM_RAM_LABEL.to_string());
    let iomem = iomem
        .or(saved.iomem)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_IOMEM));
    let chunk_size = chunk_size.or(saved.chunk_size).unwrap_or(DEFAULT_CHUNK_SIZE);

    let root = IomemRegistry::new(&iomem)
        .snapshot()
        .with_context(|| format!("Failed to read {}", iomem.display()))?;
    let ranges: Vec<MemoryRange> = root.ranges_labeled(&label).collect();

    print!("{}", format_ranges(&ranges, &label, chunk_size));
    Ok(())
}

/// Render one line per range plus a totals line
fn format_ranges(ranges: &[MemoryRange], label: &str, chunk_size: usize) -> String {
    let mut out = String::new();

    if ranges.is_empty() {
        out.push_str(&format!("No '{}' ranges found\n", label));
        return out;
    }

    let mut total: u64 = 0;
    let mut windows: u64 = 0;
    for range in ranges {
        out.push_str(&format!("{}  {:>8} MB\n", range, range.size() / (1 << 20)));
        total = total.saturating_add(range.size());
        windows += range.window_count(chunk_size);
    }

    out.push_str(&format!(
        "{} '{}' ranges, {} bytes ({} MB), {} windows of {:#x} bytes\n",
        ranges.len(),
        label,
        total,
        total / (1 << 20),
        windows,
        chunk_size
    ));
    out
}
