//! Physical Memory Trait
//!
//! Core abstraction for mapping physical memory windows.

use std::io;
use std::ops::Deref;

/// Trait for mapping windows of physical memory (`/dev/mem`, mocks, etc.)
///
/// A window stays mapped exactly as long as the returned value lives;
/// dropping it releases the mapping.
pub trait PhysicalMemory {
    /// A mapped view of `len` bytes of physical memory
    type Window<'a>: Deref<Target = [u8]>
    where
        Self: 'a;

    /// Map `len` bytes of physical memory starting at `start`
    fn map(&self, start: u64, len: usize) -> io::Result<Self::Window<'_>>;
}
