//! Physical Memory Range Types
//!
//! Inclusive physical address ranges and the chunk windows that cover them.

use serde::Serialize;
use std::fmt;

/// An inclusive physical address range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Create a range, or `None` if `start > end`
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(MemoryRange { start, end })
    }

    /// Number of bytes covered, saturating at `u64::MAX` for the full address space
    pub fn size(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// Iterate the `(start, len)` sub-windows of at most `chunk_size` bytes
    /// that cover the range in ascending order.
    pub fn windows(&self, chunk_size: usize) -> Windows {
        Windows {
            next: (chunk_size > 0).then_some(self.start),
            end: self.end,
            chunk_size: chunk_size as u64,
        }
    }

    /// Number of windows `windows(chunk_size)` yields
    pub fn window_count(&self, chunk_size: usize) -> u64 {
        if chunk_size == 0 {
            return 0;
        }
        let chunk = chunk_size as u64;
        (self.end - self.start) / chunk + 1
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#014x}-{:#014x}", self.start, self.end)
    }
}

/// Iterator over the chunk windows of a [`MemoryRange`]
#[derive(Debug, Clone)]
pub struct Windows {
    next: Option<u64>,
    end: u64,
    chunk_size: u64,
}

impl Iterator for Windows {
    type Item = (u64, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next?;

        // remaining - 1, so a range ending at u64::MAX never overflows
        let last_offset = self.end - start;
        let len = if last_offset >= self.chunk_size - 1 {
            self.chunk_size
        } else {
            last_offset + 1
        };

        self.next = start
            .checked_add(len)
            .filter(|&next| next <= self.end);

        Some((start, len as usize))
    }
}
