use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::comparison::Color;
use crate::filesystem::DirectoryNode;

/// One entry of a comparison chart. Directories carry a `value` of 0 (the
/// renderer derives their size from the children), files their own size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonNode {
    pub name: String,
    pub value: u64,
    pub children: Vec<ComparisonNode>,
    pub color: Color,
}

impl ComparisonNode {
    fn file(name: &str, size: u64, color: Color) -> Self {
        Self {
            name: name.to_string(),
            value: size,
            children: Vec::new(),
            color,
        }
    }

    /// Sum of all file sizes in this subtree, `None` if it does not fit in a `u64`
    pub fn subtree_size(&self) -> Option<u64> {
        let mut pending = vec![self];
        let mut total = 0u64;
        while let Some(node) = pending.pop() {
            total = total.checked_add(node.value)?;
            pending.extend(&node.children);
        }
        Some(total)
    }
}

/// Builds the left and the right comparison chart of two directory trees.
///
/// Entries are paired by name at the same position in both trees; an entry
/// only present on one side is blue, as is everything below it. Each side
/// lists only its own entries, files first, in the order of its input maps.
pub fn compare(
    left: Option<&DirectoryNode>,
    right: Option<&DirectoryNode>,
) -> (Option<ComparisonNode>, Option<ComparisonNode>) {
    let left_view = left.map(|own| build_view(&own.name, own, right));
    let right_view = right.map(|own| build_view(&own.name, own, left));
    debug!(
        "Compared trees (left present: {}, right present: {})",
        left_view.is_some(),
        right_view.is_some()
    );
    (left_view, right_view)
}

fn build_view(
    name: &str,
    own: &DirectoryNode,
    counterpart: Option<&DirectoryNode>,
) -> ComparisonNode {
    let files = own.files.iter().map(|(file_name, &size)| {
        let other_size = counterpart.and_then(|other| other.files.get(file_name).copied());
        ComparisonNode::file(file_name, size, Color::classify(size, other_size))
    });
    let directories = own.directories.iter().map(|(dir_name, subdirectory)| {
        let other_subdirectory = counterpart.and_then(|other| other.directories.get(dir_name));
        build_view(dir_name, subdirectory, other_subdirectory)
    });

    ComparisonNode {
        name: name.to_string(),
        value: 0,
        children: files.chain(directories).collect(),
        color: Color::classify(own.total_size, counterpart.map(|other| other.total_size)),
    }
}
