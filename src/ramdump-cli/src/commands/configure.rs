//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up ramdump CLI defaults.

use crate::cli::GapArg;
use crate::config::Config;
use anyhow::Result;
use ramdump::AcquireConfig;
use std::path::PathBuf;

/// Handle the configure command
pub fn handle(
    output: Option<PathBuf>,
    chunk_size: Option<usize>,
    label: Option<String>,
    gap_policy: Option<GapArg>,
    show: bool,
) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if !apply(&mut config, output, chunk_size, label, gap_policy)? {
        show_usage();
        return Ok(());
    }

    config.save()?;
    println!("Configuration updated");
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Apply requested changes; returns false if nothing was requested
fn apply(
    config: &mut Config,
    output: Option<PathBuf>,
    chunk_size: Option<usize>,
    label: Option<String>,
    gap_policy: Option<GapArg>,
) -> Result<bool> {
    let changed =
        output.is_some() || chunk_size.is_some() || label.is_some() || gap_policy.is_some();

    if let Some(output) = output {
        config.output = Some(output);
    }
    if let Some(chunk_size) = chunk_size {
        config.chunk_size = Some(chunk_size);
    }
    if let Some(label) = label {
        config.label = Some(label);
    }
    if let Some(policy) = gap_policy {
        config.gap_policy = Some(policy.into());
    }

    // Reject settings an acquisition would refuse later
    let mut probe = AcquireConfig::new(
        config
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from("ram.raw")),
    );
    if let Some(chunk_size) = config.chunk_size {
        probe = probe.with_chunk_size(chunk_size);
    }
    if let Some(label) = &config.label {
        probe = probe.with_label(label.clone());
    }
    probe.validate()?;

    Ok(changed)
}

/// Display current configuration
fn show_config(config: &Config) {
    let show = |name: &str, value: Option<String>| match value {
        Some(v) => println!("{}: {}", name, v),
        None => println!("{}: (default)", name),
    };

    show("Output", config.output.as_ref().map(|p| p.display().to_string()));
    show("Chunk size", config.chunk_size.map(|c| format!("{:#x}", c)));
    show("Label", config.label.clone());
    show("Gap policy", config.gap_policy.map(|g| g.to_string()));
    show("Device", config.device.as_ref().map(|p| p.display().to_string()));
    show("Registry", config.iomem.as_ref().map(|p| p.display().to_string()));

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: ramdump configure --output /path/to/ram.raw [--chunk-size 4M]");
    println!("   or: ramdump configure --show");
}
