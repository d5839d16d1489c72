//! Mock Physical Memory
//!
//! A mock physical memory for testing the copier and sessions.

use super::PhysicalMemory;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::io;
use std::ops::Deref;

/// Byte the mock reports at a physical address
pub fn expected_byte(address: u64) -> u8 {
    (address ^ (address >> 8) ^ (address >> 16)) as u8
}

/// A mock physical memory where every address holds [`expected_byte`]
///
/// Tracks map/unmap calls so tests can verify that windows never overlap
/// and are always released.
#[derive(Default)]
pub struct MockPhysicalMemory {
    /// Window start addresses whose mapping fails
    pub fail_at: HashSet<u64>,
    /// Every `(start, len)` passed to `map`, in call order
    pub calls: RefCell<Vec<(u64, usize)>>,
    /// Windows currently mapped
    pub live: Cell<usize>,
    /// Highest number of windows mapped at once
    pub max_live: Cell<usize>,
    /// Windows released
    pub unmapped: Cell<usize>,
}

impl MockPhysicalMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails to map windows starting at the given addresses
    pub fn failing_at(addresses: &[u64]) -> Self {
        Self {
            fail_at: addresses.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn map_attempts(&self) -> usize {
        self.calls.borrow().len()
    }
}

/// A mapped mock window; decrements the live count on drop
pub struct MockWindow<'a> {
    data: Vec<u8>,
    owner: &'a MockPhysicalMemory,
}

impl Deref for MockWindow<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for MockWindow<'_> {
    fn drop(&mut self) {
        self.owner.live.set(self.owner.live.get() - 1);
        self.owner.unmapped.set(self.owner.unmapped.get() + 1);
    }
}

impl PhysicalMemory for MockPhysicalMemory {
    type Window<'a> = MockWindow<'a>;

    fn map(&self, start: u64, len: usize) -> io::Result<MockWindow<'_>> {
        self.calls.borrow_mut().push((start, len));

        if self.fail_at.contains(&start) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("mock refused window at {:#x}", start),
            ));
        }

        let data = (0..len as u64).map(|i| expected_byte(start + i)).collect();

        let live = self.live.get() + 1;
        self.live.set(live);
        self.max_live.set(self.max_live.get().max(live));

        Ok(MockWindow { data, owner: self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_map_contents() {
        let mem = MockPhysicalMemory::new();
        let window = mem.map(0x1000, 4).unwrap();
        let expected: Vec<u8> = (0x1000..0x1004).map(expected_byte).collect();
        assert_eq!(&window[..], &expected[..]);
    }

    #[test]
    fn test_mock_tracks_live_windows() {
        let mem = MockPhysicalMemory::new();
        {
            let _a = mem.map(0x1000, 16).unwrap();
            let _b = mem.map(0x2000, 16).unwrap();
            assert_eq!(mem.live.get(), 2);
        }
        assert_eq!(mem.live.get(), 0);
        assert_eq!(mem.unmapped.get(), 2);
        assert_eq!(mem.max_live.get(), 2);
    }

    #[test]
    fn test_mock_failing_window() {
        let mem = MockPhysicalMemory::failing_at(&[0x2000]);
        assert!(mem.map(0x1000, 16).is_ok());
        assert!(mem.map(0x2000, 16).is_err());
        assert_eq!(mem.map_attempts(), 2);
        assert_eq!(mem.live.get(), 0);
    }
}
