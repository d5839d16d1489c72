//! `/dev/mem` Physical Memory Source
//!
//! Maps physical memory through the kernel's memory device.

use super::PhysicalMemory;
use crate::error::{AcquireError, Result};

use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Default physical memory device
pub const DEFAULT_DEVICE: &str = "/dev/mem";

/// Physical memory accessed through a `/dev/mem`-style device
///
/// Windows are shared read-only mappings of the device. For pages the kernel
/// owns as System RAM, `/dev/mem` hands out the normal write-back cached
/// attributes, so the copy reads coherent RAM rather than device I/O space.
pub struct DevMem {
    file: File,
    /// Path to the device
    pub path: PathBuf,
}

impl DevMem {
    /// Open the physical memory device read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| AcquireError::Device {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(device = %path.display(), "opened physical memory device");

        Ok(DevMem { file, path })
    }
}

impl PhysicalMemory for DevMem {
    type Window<'a> = Mmap;

    fn map(&self, start: u64, len: usize) -> io::Result<Mmap> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot map an empty window",
            ));
        }

        // SAFETY: the mapping is read-only. Its contents change underneath us
        // while the system runs, which only affects the bytes copied.
        unsafe { MmapOptions::new().offset(start).len(len).map(&self.file) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_missing_device() {
        let err = DevMem::open("/nonexistent/dev/mem").err().unwrap();
        assert!(matches!(err, AcquireError::Device { .. }));
        assert_eq!(err.code(), libc::ENOENT);
    }

    #[test]
    fn test_map_regular_file_as_device() {
        // A regular file stands in for the device: offsets are "physical" addresses
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..0x3000u32).map(|i| (i % 251) as u8).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let mem = DevMem::open(file.path()).unwrap();
        let window = mem.map(0x1000, 0x1000).unwrap();
        assert_eq!(&window[..], &data[0x1000..0x2000]);
    }

    #[test]
    fn test_map_unaligned_offset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..0x2000u32).map(|i| (i % 13) as u8).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let mem = DevMem::open(file.path()).unwrap();
        let window = mem.map(0x123, 0x40).unwrap();
        assert_eq!(&window[..], &data[0x123..0x163]);
    }

    #[test]
    fn test_map_empty_window_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mem = DevMem::open(file.path()).unwrap();
        assert!(mem.map(0, 0).is_err());
    }
}
