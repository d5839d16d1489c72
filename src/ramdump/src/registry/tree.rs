//! Resource Tree
//!
//! Owned resource nodes and the depth-first range enumerator.

use crate::source::MemoryRange;

/// One entry of the physical resource tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    pub start: u64,
    pub end: u64,
    pub name: String,
    pub children: Vec<ResourceNode>,
}

impl ResourceNode {
    pub fn new(start: u64, end: u64, name: impl Into<String>) -> Self {
        ResourceNode {
            start,
            end,
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Synthetic root spanning the whole physical address space
    pub fn root() -> Self {
        Self::new(0, u64::MAX, "iomem")
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: ResourceNode) -> Self {
        self.children.push(child);
        self
    }

    /// Walk the tree below this node and yield every range labeled `label`
    pub fn ranges_labeled<'a>(&'a self, label: &'a str) -> SystemRamRanges<'a> {
        SystemRamRanges::new(self, label)
    }

    /// Total number of nodes below this one
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// Lazy depth-first enumerator over a [`ResourceNode`] tree
///
/// Yields ranges in sibling order. A matching node's children are not
/// visited, so nested entries under usable RAM (kernel code, crash kernel)
/// never produce a second copy of the same bytes.
pub struct SystemRamRanges<'a> {
    stack: Vec<&'a ResourceNode>,
    label: &'a str,
}

impl<'a> SystemRamRanges<'a> {
    pub fn new(root: &'a ResourceNode, label: &'a str) -> Self {
        SystemRamRanges {
            stack: root.children.iter().rev().collect(),
            label,
        }
    }
}

impl Iterator for SystemRamRanges<'_> {
    type Item = MemoryRange;

    fn next(&mut self) -> Option<MemoryRange> {
        while let Some(node) = self.stack.pop() {
            if node.name == self.label {
                match MemoryRange::new(node.start, node.end) {
                    Some(range) => return Some(range),
                    None => {
                        tracing::debug!(
                            start = node.start,
                            end = node.end,
                            "skipping inverted resource entry"
                        );
                        continue;
                    }
                }
            }

            self.stack.extend(node.children.iter().rev());
        }

        None
    }
}
