//! Physical Memory Source Abstraction
//!
//! Core abstractions for mapping physical memory:
//! - Physical ranges and their chunk windows via `MemoryRange`
//! - The `/dev/mem` device via `DevMem`
//! - Mock physical memory for testing

mod devmem;
#[cfg(test)]
mod mock;
mod region;
mod traits;

pub use devmem::{DevMem, DEFAULT_DEVICE};
pub use region::{MemoryRange, Windows};
pub use traits::PhysicalMemory;

#[cfg(test)]
pub mod tests {
    pub use super::mock::{expected_byte, MockPhysicalMemory};
}
