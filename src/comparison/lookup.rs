use tracing::debug;

use crate::comparison::ComparisonNode;

/// A node inside a rendered chart that knows its parent.
///
/// Chart libraries keep their own node wrappers; implementing this for such a
/// wrapper is all that is needed to resolve a selection in the other chart.
pub trait TreePosition: Sized {
    fn name(&self) -> &str;
    fn parent(&self) -> Option<Self>;
}

/// Names from just below the root down to `selected`. The root's own name is
/// left out, as both charts share an implicit common root.
pub fn path_from_root<P: TreePosition>(selected: &P) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = selected
        .parent()
        .map(|parent| (selected.name().to_string(), parent));

    while let Some((name, parent)) = current {
        path.push(name);
        current = parent
            .parent()
            .map(|grandparent| (parent.name().to_string(), grandparent));
    }

    path.reverse();
    path
}

/// Finds the node of `other_root` at the same name path as `selected`.
///
/// Returns `None` as soon as a path segment has no matching child, so entries
/// that were renamed or moved between the two trees are not found.
pub fn find_corresponding<'t, P: TreePosition>(
    selected: &P,
    other_root: &'t ComparisonNode,
) -> Option<&'t ComparisonNode> {
    let path = path_from_root(selected);
    let found = descend(other_root, path.iter().map(String::as_str));
    if found.is_none() {
        debug!("No counterpart for /{}", path.join("/"));
    }
    found
}

fn descend<'t, 's>(
    root: &'t ComparisonNode,
    mut path: impl Iterator<Item = &'s str>,
) -> Option<&'t ComparisonNode> {
    path.try_fold(root, |node, segment| {
        node.children.iter().find(|child| child.name == segment)
    })
}

/// Chart-side view of a comparison tree in which every node knows its parent
#[derive(Debug, Clone)]
pub struct ChartTree<'a> {
    entries: Vec<ChartEntry<'a>>,
}

#[derive(Debug, Clone)]
struct ChartEntry<'a> {
    node: &'a ComparisonNode,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl<'a> ChartTree<'a> {
    pub fn new(root: &'a ComparisonNode) -> Self {
        let mut entries = vec![ChartEntry {
            node: root,
            parent: None,
            children: Vec::new(),
        }];
        let mut pending = vec![0];

        while let Some(index) = pending.pop() {
            let node = entries[index].node;
            for child in &node.children {
                let child_index = entries.len();
                entries.push(ChartEntry {
                    node: child,
                    parent: Some(index),
                    children: Vec::new(),
                });
                entries[index].children.push(child_index);
                pending.push(child_index);
            }
        }

        Self { entries }
    }

    pub fn root(&self) -> ChartPosition<'_> {
        ChartPosition {
            tree: self,
            index: 0,
        }
    }

    /// Resolves a slash separated path below the root, e.g. `/etc/os-release`
    pub fn locate(&self, path: &str) -> Option<ChartPosition<'_>> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root(), |position, segment| {
                position
                    .children()
                    .find(|child| child.name() == segment)
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A node of a [`ChartTree`]
#[derive(Debug, Clone, Copy)]
pub struct ChartPosition<'t> {
    tree: &'t ChartTree<'t>,
    index: usize,
}

impl<'t> ChartPosition<'t> {
    pub fn node(&self) -> &'t ComparisonNode {
        self.tree.entries[self.index].node
    }

    pub fn children(&self) -> impl Iterator<Item = ChartPosition<'t>> + use<'t> {
        let tree = self.tree;
        tree.entries[self.index]
            .children
            .iter()
            .map(move |&index| ChartPosition { tree, index })
    }
}

impl TreePosition for ChartPosition<'_> {
    fn name(&self) -> &str {
        &self.node().name
    }

    fn parent(&self) -> Option<Self> {
        self.tree.entries[self.index]
            .parent
            .map(|index| ChartPosition {
                tree: self.tree,
                index,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::{Color, compare};
    use crate::filesystem::DirectoryNode;

    fn charts() -> (ComparisonNode, ComparisonNode) {
        let mut left = DirectoryNode::new("/");
        left.insert_file("etc/os-release", 10).unwrap();
        left.insert_file("etc/passwd", 3).unwrap();
        left.insert_file("usr/lib/libc.so", 100).unwrap();
        left.insert_file("secret", 1).unwrap();

        let mut right = DirectoryNode::new("/");
        right.insert_file("etc/os-release", 12).unwrap();
        right.insert_file("usr/lib/libc.so", 100).unwrap();
        right.insert_file("usr/share/doc", 5).unwrap();

        let (left, right) = compare(Some(&left), Some(&right));
        (left.unwrap(), right.unwrap())
    }

    /// A parent-linked node as a chart library would hand it out
    struct LinkedNode<'a> {
        name: &'a str,
        parent: Option<&'a LinkedNode<'a>>,
    }

    impl<'a> TreePosition for &'a LinkedNode<'a> {
        fn name(&self) -> &str {
            self.name
        }

        fn parent(&self) -> Option<Self> {
            self.parent
        }
    }

    #[test]
    fn path_from_root_excludes_the_root_name() {
        let (left, _) = charts();
        let tree = ChartTree::new(&left);

        let selected = tree.locate("/usr/lib/libc.so").unwrap();

        assert_eq!(path_from_root(&selected), ["usr", "lib", "libc.so"]);
        assert!(path_from_root(&tree.root()).is_empty());
    }

    #[test]
    fn finds_the_counterpart_in_both_directions() {
        let (left, right) = charts();
        let left_tree = ChartTree::new(&left);
        let right_tree = ChartTree::new(&right);

        let from_left = left_tree.locate("etc/os-release").unwrap();
        let found = find_corresponding(&from_left, &right).unwrap();
        assert_eq!(found.name, "os-release");
        assert_eq!(found.value, 12);
        assert_eq!(found.color, Color::Red);

        let from_right = right_tree.locate("etc/os-release").unwrap();
        let found = find_corresponding(&from_right, &left).unwrap();
        assert_eq!(found.value, 10);
        assert_eq!(found.color, Color::Green);
    }

    #[test]
    fn every_shared_path_round_trips() {
        let (left, right) = charts();
        let left_tree = ChartTree::new(&left);
        let right_tree = ChartTree::new(&right);

        for path in ["etc", "etc/os-release", "usr", "usr/lib", "usr/lib/libc.so"] {
            let from_left = left_tree.locate(path).unwrap();
            let from_right = right_tree.locate(path).unwrap();

            assert_eq!(find_corresponding(&from_left, &right), Some(from_right.node()));
            assert_eq!(find_corresponding(&from_right, &left), Some(from_left.node()));
        }
    }

    #[test]
    fn one_sided_paths_are_not_found() {
        let (left, right) = charts();
        let left_tree = ChartTree::new(&left);
        let right_tree = ChartTree::new(&right);

        let secret = left_tree.locate("secret").unwrap();
        let passwd = left_tree.locate("/etc/passwd").unwrap();
        let doc = right_tree.locate("/usr/share/doc").unwrap();

        assert!(find_corresponding(&secret, &right).is_none());
        assert!(find_corresponding(&passwd, &right).is_none());
        assert!(find_corresponding(&doc, &left).is_none());
    }

    #[test]
    fn root_corresponds_to_the_other_root() {
        let (left, right) = charts();
        let left_tree = ChartTree::new(&left);

        assert_eq!(find_corresponding(&left_tree.root(), &right), Some(&right));
    }

    #[test]
    fn works_with_any_parent_linked_node() {
        let (_, right) = charts();
        let root = LinkedNode {
            name: "renderer-root",
            parent: None,
        };
        let usr = LinkedNode {
            name: "usr",
            parent: Some(&root),
        };
        let share = LinkedNode {
            name: "share",
            parent: Some(&usr),
        };
        let missing = LinkedNode {
            name: "missing",
            parent: Some(&usr),
        };

        let found = find_corresponding(&&share, &right).unwrap();
        assert_eq!(found.name, "share");
        assert_eq!(found.color, Color::Blue);
        assert!(find_corresponding(&&missing, &right).is_none());
    }

    #[test]
    fn chart_tree_indexes_every_node() {
        let (left, _) = charts();
        let tree = ChartTree::new(&left);

        // root, secret, etc, os-release, passwd, usr, lib, libc.so
        assert_eq!(tree.len(), 8);
        assert!(tree.locate("usr/missing").is_none());
        let lib = tree.locate("usr/lib").unwrap();
        let parent = lib.parent().expect("lib should have a parent");
        assert_eq!(parent.node().name, "usr");
        let children = lib
            .children()
            .map(|child| child.node().name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(children, ["libc.so"]);
    }
}
