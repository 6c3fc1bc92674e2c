use hashlink::linked_hash_map;
use serde::Serialize;
use tracing::debug;

use crate::filesystem::DirectoryNode;
use crate::sunburst::DepthLimit;

/// Parallel arrays describing every entry of a directory tree, in the shape a
/// sunburst renderer consumes.
///
/// Row `i` is the entry `labels[i]` of size `values[i]`, identified by its
/// full path `ids[i]` and placed below the entry `parents[i]` (empty for
/// entries of the root). Rows are in pre-order, with the files of a directory
/// before its subdirectories.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FlatChart {
    labels: Vec<String>,
    values: Vec<u64>,
    ids: Vec<String>,
    parents: Vec<String>,
}

/// A directory whose subdirectories are still being enumerated
struct Frame<'a> {
    id: String,
    depth: usize,
    subdirectories: linked_hash_map::Iter<'a, String, DirectoryNode>,
}

impl FlatChart {
    pub fn from_directory(root: &DirectoryNode, limit: DepthLimit) -> Self {
        let mut chart = FlatChart::default();
        let mut stack = Vec::from_iter(chart.enter(root, String::new(), 0, limit));

        while let Some(frame) = stack.last_mut() {
            let Some((name, subdirectory)) = frame.subdirectories.next() else {
                stack.pop();
                continue;
            };

            let id = format!("{}/{}", frame.id, name);
            let depth = frame.depth + 1;
            chart.push_row(name, subdirectory.total_size, id.clone(), frame.id.clone());
            if let Some(child) = chart.enter(subdirectory, id, depth, limit) {
                stack.push(child);
            }
        }

        debug!("Flattened '{}' into {} rows", root.name, chart.len());
        chart
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Emits the file rows of `directory` and returns the frame that
    /// enumerates its subdirectories, unless `depth` is beyond the limit.
    fn enter<'a>(
        &mut self,
        directory: &'a DirectoryNode,
        id: String,
        depth: usize,
        limit: DepthLimit,
    ) -> Option<Frame<'a>> {
        if limit.is_exceeded_at(depth) {
            return None;
        }

        for (name, &size) in directory.files.iter() {
            self.push_row(name, size, format!("{id}/{name}"), id.clone());
        }

        Some(Frame {
            id,
            depth,
            subdirectories: directory.directories.iter(),
        })
    }

    fn push_row(&mut self, label: &str, value: u64, id: String, parent: String) {
        self.labels.push(label.to_string());
        self.values.push(value);
        self.ids.push(id);
        self.parents.push(parent);
    }
}

/// Renderer payload: a sunburst trace whose parent values are the totals of
/// their children rather than an extra share on top of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunburstTrace {
    #[serde(rename = "type")]
    kind: &'static str,
    branchvalues: &'static str,
    #[serde(flatten)]
    chart: FlatChart,
}

impl SunburstTrace {
    pub fn new(chart: FlatChart) -> Self {
        Self {
            kind: "sunburst",
            branchvalues: "total",
            chart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn example_tree() -> DirectoryNode {
        serde_json::from_str(
            r#"{
                "dirname": "/",
                "total_size": 1000,
                "files": { "file_1": 1, "file_2": 2 },
                "directories": {
                    "etc": {
                        "dirname": "etc",
                        "total_size": 100,
                        "files": { "os-release": 3, "passwd": 4 },
                        "directories": {}
                    }
                }
            }"#,
        )
        .unwrap()
    }

    /// Four levels: /a (dir), /a/b (dir), /a/b/c (dir), /a/b/c/leaf (file)
    fn nested_tree() -> DirectoryNode {
        let mut root = DirectoryNode::new("/");
        root.insert_file("top", 1).unwrap();
        root.insert_file("a/b/c/leaf", 8).unwrap();
        root.insert_file("a/b/mid", 2).unwrap();
        root
    }

    fn segments(id: &str) -> usize {
        id.split('/').filter(|segment| !segment.is_empty()).count()
    }

    #[test]
    fn empty_directory_yields_empty_chart() {
        let chart = FlatChart::from_directory(&DirectoryNode::new("/"), DepthLimit::Unlimited);

        assert!(chart.is_empty());
        assert!(chart.labels().is_empty());
        assert!(chart.values().is_empty());
        assert!(chart.ids().is_empty());
        assert!(chart.parents().is_empty());
    }

    #[test]
    fn flattens_files_before_directories_in_pre_order() {
        let chart = FlatChart::from_directory(&example_tree(), DepthLimit::Unlimited);

        assert_eq!(
            chart.labels(),
            ["file_1", "file_2", "etc", "os-release", "passwd"]
        );
        assert_eq!(
            chart.ids(),
            ["/file_1", "/file_2", "/etc", "/etc/os-release", "/etc/passwd"]
        );
        assert_eq!(chart.values(), [1, 2, 100, 3, 4]);
        assert_eq!(chart.parents(), ["", "", "", "/etc", "/etc"]);
    }

    #[test]
    fn subdirectories_are_descended_before_their_next_sibling() {
        let mut root = DirectoryNode::new("/");
        root.insert_file("usr/bin/env", 1).unwrap();
        root.insert_file("var/log", 1).unwrap();

        let chart = FlatChart::from_directory(&root, DepthLimit::Unlimited);

        assert_eq!(
            chart.ids(),
            ["/usr", "/usr/bin", "/usr/bin/env", "/var", "/var/log"]
        );
    }

    #[test]
    fn ids_are_parent_and_label_joined() {
        let chart = FlatChart::from_directory(&nested_tree(), DepthLimit::Unlimited);

        assert_eq!(chart.labels().len(), chart.len());
        assert_eq!(chart.values().len(), chart.len());
        assert_eq!(chart.parents().len(), chart.len());
        for row in 0..chart.len() {
            assert_eq!(
                chart.ids()[row],
                format!("{}/{}", chart.parents()[row], chart.labels()[row])
            );
            let parent = &chart.parents()[row];
            assert!(parent.is_empty() || chart.ids()[..row].contains(parent));
        }
    }

    #[test]
    fn directory_rows_use_the_map_key() {
        let mut root = example_tree();
        if let Some(etc) = root.directories.get_mut("etc") {
            etc.name = "something-else".to_string();
        }

        let chart = FlatChart::from_directory(&root, DepthLimit::Unlimited);

        assert_eq!(chart.parents()[3], "/etc");
        assert_eq!(chart.ids()[3], "/etc/os-release");
    }

    #[rstest]
    #[case(1, 2)]
    #[case(2, 3)]
    #[case(3, 4)]
    fn depth_limit_bounds_id_segments(#[case] max_depth: i64, #[case] max_segments: usize) {
        let chart = FlatChart::from_directory(&nested_tree(), DepthLimit::from(max_depth));

        let deepest = chart.ids().iter().map(|id| segments(id)).max().unwrap();
        assert_eq!(deepest, max_segments);
    }

    #[test]
    fn boundary_directories_keep_their_total() {
        let chart = FlatChart::from_directory(&nested_tree(), DepthLimit::Levels(1));

        assert_eq!(chart.ids(), ["/top", "/a", "/a/b"]);
        assert_eq!(chart.values(), [1, 10, 10]);
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    fn non_positive_depth_is_unlimited(#[case] max_depth: i64) {
        let limited = FlatChart::from_directory(&nested_tree(), DepthLimit::from(max_depth));
        let unlimited = FlatChart::from_directory(&nested_tree(), DepthLimit::Unlimited);

        assert_eq!(limited, unlimited);
    }

    #[test]
    fn flattening_is_deterministic_and_leaves_input_untouched() {
        let root = nested_tree();
        let snapshot = root.clone();

        let first = FlatChart::from_directory(&root, DepthLimit::Levels(2));
        let second = FlatChart::from_directory(&root, DepthLimit::Levels(2));

        assert_eq!(first, second);
        assert_eq!(root, snapshot);
    }

    #[test]
    fn very_deep_trees_do_not_exhaust_the_stack() {
        let depth = 500;
        let path = vec!["d"; depth].join("/") + "/file";
        let mut root = DirectoryNode::new("/");
        root.insert_file(&path, 1).unwrap();

        let chart = FlatChart::from_directory(&root, DepthLimit::Unlimited);

        assert_eq!(chart.len(), depth + 1);
        assert_eq!(segments(chart.ids().last().unwrap()), depth + 1);
    }

    #[test]
    fn trace_serializes_with_total_branch_values() {
        let chart = FlatChart::from_directory(&example_tree(), DepthLimit::Unlimited);

        let json = serde_json::to_value(SunburstTrace::new(chart)).unwrap();

        assert_eq!(json["type"], "sunburst");
        assert_eq!(json["branchvalues"], "total");
        assert_eq!(json["labels"][2], "etc");
        assert_eq!(json["values"][2], 100);
        assert_eq!(json["parents"][4], "/etc");
    }
}
