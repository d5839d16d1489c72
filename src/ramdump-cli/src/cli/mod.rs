//! CLI argument definitions for ramdump
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;

pub use core::{AcquireArgs, Cli, Commands, GapArg};
