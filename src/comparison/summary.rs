use colored::Colorize;

use crate::comparison::{Color, ComparisonNode};
use crate::ext::{ByteSizeExt, SizeFormatError};
use crate::sunburst::DepthLimit;

const INDENT: &str = "  ";

/// Renders a comparison chart as an indented listing, one entry per line,
/// each name tinted with its comparison color.
pub fn render_summary(root: &ComparisonNode, limit: DepthLimit) -> Result<String, SizeFormatError> {
    let entries = pre_order(root);
    let sizes = subtree_sizes(&entries).ok_or(SizeFormatError::TooLarge { bytes: u64::MAX })?;

    let mut lines = vec![legend()];
    for (entry, size) in entries.iter().zip(sizes) {
        if entry.depth > 0 && limit.is_exceeded_at(entry.depth - 1) {
            continue;
        }
        lines.push(format!(
            "{}{} {} [{}]",
            INDENT.repeat(entry.depth),
            entry.node.name.as_str().color(entry.node.color),
            size.to_human_size()?,
            entry.node.color
        ));
    }

    Ok(lines.join("\n"))
}

struct Entry<'a> {
    node: &'a ComparisonNode,
    depth: usize,
    parent: Option<usize>,
}

fn pre_order(root: &ComparisonNode) -> Vec<Entry<'_>> {
    let mut entries = Vec::new();
    let mut pending = vec![(root, 0, None)];

    while let Some((node, depth, parent)) = pending.pop() {
        let index = entries.len();
        entries.push(Entry {
            node,
            depth,
            parent,
        });
        pending.extend(
            node.children
                .iter()
                .rev()
                .map(|child| (child, depth + 1, Some(index))),
        );
    }

    entries
}

/// Folds sizes into their parents from the last entry backwards. Relies on
/// every child coming after its parent in pre-order.
fn subtree_sizes(entries: &[Entry<'_>]) -> Option<Vec<u64>> {
    let mut sizes = entries.iter().map(|entry| entry.node.value).collect::<Vec<_>>();
    for (index, entry) in entries.iter().enumerate().rev() {
        if let Some(parent) = entry.parent {
            sizes[parent] = sizes[parent].checked_add(sizes[index])?;
        }
    }
    Some(sizes)
}

fn legend() -> String {
    [
        (Color::Red, "larger"),
        (Color::Green, "smaller"),
        (Color::Yellow, "same size"),
        (Color::Blue, "only on this side"),
    ]
    .iter()
    .map(|(color, meaning)| format!("{}: {}", color.to_string().color(*color), meaning))
    .collect::<Vec<_>>()
    .join(", ")
}
