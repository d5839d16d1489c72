//! # ramdump
//!
//! Physical RAM acquisition library.
//!
//! This library provides functionality to:
//! - Enumerate the physical address ranges the kernel classifies as "System RAM"
//! - Map each range through `/dev/mem` in bounded chunks
//! - Stream the copied bytes into a raw dump file, tolerating unmappable chunks
//!
//! ## Example
//!
//! ```no_run
//! use ramdump::{AcquireConfig, AcquisitionSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AcquireConfig::new("/root/ram.raw");
//! let report = AcquisitionSession::new(config)?.run()?;
//!
//! println!(
//!     "Wrote {} bytes from {} ranges ({} windows skipped)",
//!     report.bytes_written,
//!     report.ranges,
//!     report.skipped.len()
//! );
//! # Ok(())
//! # }
//! ```

pub mod copier;
pub mod error;
pub mod registry;
pub mod session;
pub mod sink;
pub mod source;

#[doc(inline)]
pub use copier::{ChunkedCopier, CopyStats, GapPolicy, SkippedWindow};
#[doc(inline)]
pub use error::{AcquireError, Result};
#[doc(inline)]
pub use registry::{
    parse_iomem, IomemRegistry, ResourceNode, ResourceRegistry, SystemRamRanges, DEFAULT_IOMEM,
    SYSTEM_RAM_LABEL,
};
#[doc(inline)]
pub use session::{
    AcquireConfig, AcquisitionReport, AcquisitionSession, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE,
};
#[doc(inline)]
pub use sink::{FileSink, Sink, SinkWriter};
#[doc(inline)]
pub use source::{DevMem, MemoryRange, PhysicalMemory, DEFAULT_DEVICE};
