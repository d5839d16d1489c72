//! `/proc/iomem` Registry
//!
//! Parses the kernel's physical resource listing into a [`ResourceNode`] tree.

use super::{ResourceNode, ResourceRegistry};
use crate::error::{AcquireError, Result};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default location of the kernel's physical resource listing
pub const DEFAULT_IOMEM: &str = "/proc/iomem";

/// Registry backed by a `/proc/iomem`-format file
#[derive(Debug, Clone)]
pub struct IomemRegistry {
    pub path: PathBuf,
}

impl IomemRegistry {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        IomemRegistry {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Default for IomemRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IOMEM)
    }
}

impl ResourceRegistry for IomemRegistry {
    fn snapshot(&self) -> Result<ResourceNode> {
        let registry_error = |source| AcquireError::Registry {
            path: self.path.clone(),
            source,
        };

        let contents = fs::read_to_string(&self.path).map_err(registry_error)?;
        let root = parse_iomem(&contents);

        // Without CAP_SYS_ADMIN the kernel prints every address as zero
        if root.descendant_count() > 0 && addresses_hidden(&root) {
            tracing::error!(
                path = %self.path.display(),
                "resource addresses are hidden; run as root"
            );
            return Err(registry_error(io::Error::from_raw_os_error(libc::EACCES)));
        }

        tracing::debug!(
            path = %self.path.display(),
            entries = root.descendant_count(),
            "read resource registry"
        );

        Ok(root)
    }
}

fn addresses_hidden(node: &ResourceNode) -> bool {
    node.children
        .iter()
        .all(|c| c.start == 0 && c.end == 0 && addresses_hidden(c))
}

/// Parse `/proc/iomem` text into a tree under [`ResourceNode::root`]
///
/// Each line is `<start>-<end> : <name>` in hex, nested two spaces per level.
/// Malformed lines are skipped.
pub fn parse_iomem(contents: &str) -> ResourceNode {
    // stack[0] is the root; stack[d] is the open node at depth d - 1
    let mut stack = vec![ResourceNode::root()];

    for line in contents.lines() {
        let Some((depth, node)) = parse_line(line) else {
            if !line.trim().is_empty() {
                tracing::debug!(line, "skipping unparseable iomem line");
            }
            continue;
        };

        // Close nodes that are not ancestors of this one
        while stack.len() > depth + 1 {
            close_top(&mut stack);
        }
        stack.push(node);
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }

    stack.pop().unwrap_or_else(ResourceNode::root)
}

fn close_top(stack: &mut Vec<ResourceNode>) {
    if let Some(node) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}

fn parse_line(line: &str) -> Option<(usize, ResourceNode)> {
    let trimmed = line.trim_start_matches(' ');
    let depth = (line.len() - trimmed.len()) / 2;

    let (span, name) = trimmed.split_once(" : ")?;
    let (start, end) = span.split_once('-')?;

    let start = u64::from_str_radix(start.trim(), 16).ok()?;
    let end = u64::from_str_radix(end.trim(), 16).ok()?;

    Some((depth, ResourceNode::new(start, end, name.trim_end())))
}
