//! Physical Resource Registry
//!
//! The kernel's tree of physical address resources, and the enumerator that
//! picks usable RAM out of it:
//! - `ResourceNode` - owned resource tree
//! - `IomemRegistry` - tree snapshots read from `/proc/iomem`
//! - `SystemRamRanges` - lazy depth-first walk yielding labeled ranges

mod iomem;
mod tree;

pub use iomem::{parse_iomem, IomemRegistry, DEFAULT_IOMEM};
pub use tree::{ResourceNode, SystemRamRanges};

use crate::error::Result;

/// Label the kernel gives general-purpose system memory
pub const SYSTEM_RAM_LABEL: &str = "System RAM";

/// A source of physical resource trees
///
/// Each call to [`ResourceRegistry::snapshot`] starts a fresh traversal; the
/// registry itself is never modified.
pub trait ResourceRegistry {
    /// Take a snapshot of the registry rooted at a synthetic root node
    fn snapshot(&self) -> Result<ResourceNode>;
}

/// An in-memory tree is its own registry
impl ResourceRegistry for ResourceNode {
    fn snapshot(&self) -> Result<ResourceNode> {
        Ok(self.clone())
    }
}
