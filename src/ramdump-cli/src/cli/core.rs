//! Core CLI definitions

use clap::{Args, Parser, Subcommand};
use ramdump::GapPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ramdump")]
#[command(about = "Physical RAM acquisition", long_about = None)]
pub struct Cli {
    /// Log debug detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dump all usable physical RAM to a raw file (requires root)
    ///
    /// While running, the session holds an exclusive lock on `<OUTPUT>.lock`.
    /// The lock file is left next to the dump afterwards and is safe to delete
    /// once no acquisition is running.
    #[command(visible_alias = "a")]
    Acquire(AcquireArgs),

    /// List the physical ranges an acquisition would copy
    #[command(visible_alias = "r")]
    Ranges {
        /// Registry label of ranges to list
        #[arg(long)]
        label: Option<String>,

        /// Path to the resource listing
        #[arg(long)]
        iomem: Option<PathBuf>,

        /// Chunk size used to count mapping windows
        #[arg(short, long, value_parser = parse_size)]
        chunk_size: Option<usize>,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Set default chunk size (e.g. 4096, 0x100000, 4M)
        #[arg(short, long, value_parser = parse_size)]
        chunk_size: Option<usize>,

        /// Set default range label
        #[arg(long)]
        label: Option<String>,

        /// Set default handling of unmappable windows
        #[arg(long, value_enum)]
        gap_policy: Option<GapArg>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Args)]
pub struct AcquireArgs {
    /// Dump file to create (truncated if it exists)
    #[arg(short, long, env = "RAMDUMP_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Bytes mapped and copied per window (e.g. 4096, 0x100000, 4M)
    #[arg(short, long, env = "RAMDUMP_CHUNK_SIZE", value_parser = parse_size)]
    pub chunk_size: Option<usize>,

    /// Registry label of ranges to acquire
    #[arg(long)]
    pub label: Option<String>,

    /// What to write for windows that cannot be mapped
    #[arg(long, value_enum)]
    pub gap_policy: Option<GapArg>,

    /// Physical memory device
    #[arg(long)]
    pub device: Option<PathBuf>,

    /// Path to the resource listing
    #[arg(long)]
    pub iomem: Option<PathBuf>,

    /// Write a JSON report of the session to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum GapArg {
    /// Leave unmappable windows out of the dump
    Skip,
    /// Write zeros in place of unmappable windows
    ZeroFill,
}

impl From<GapArg> for GapPolicy {
    fn from(arg: GapArg) -> Self {
        match arg {
            GapArg::Skip => GapPolicy::Skip,
            GapArg::ZeroFill => GapPolicy::ZeroFill,
        }
    }
}

/// Parse a byte size: decimal, `0x` hex, or with a `K`/`M`/`G` suffix
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let invalid = || format!("invalid size '{}'", s);

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return usize::from_str_radix(hex, 16).map_err(|_| invalid());
    }

    let (digits, shift) = match s.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&s[..s.len() - 1], 10),
        Some('M') => (&s[..s.len() - 1], 20),
        Some('G') => (&s[..s.len() - 1], 30),
        _ => (s, 0),
    };

    let value: usize = digits.parse().map_err(|_| invalid())?;
    value
        .checked_mul(1usize << shift)
        .ok_or_else(|| format!("size '{}' is too large", s))
}
