use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use tracing::debug;

/// Sizes of the files directly inside a directory, keyed by file name
pub type FileSizes = LinkedHashMap<String, u64>;

/// Immediate subdirectories of a directory, keyed by directory name
pub type Subdirectories = LinkedHashMap<String, DirectoryNode>;

/// Size tree of a directory including all of its subdirectories.
///
/// Both maps keep the order in which entries were inserted (or appeared in the
/// JSON document), which is the order every consumer of the tree enumerates them in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectoryNode {
    #[serde(rename = "dirname")]
    pub name: String,
    /// Size of the whole subtree in bytes, as reported by the producer
    pub total_size: u64,
    #[serde(default)]
    pub files: FileSizes,
    #[serde(default)]
    pub directories: Subdirectories,
}

impl DirectoryNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Inserts a file at `path` (relative to this directory), creating any
    /// missing intermediate directories and adjusting every total on the way.
    pub fn insert_file(&mut self, path: &str, size: u64) -> Result<(), InsertFileError> {
        let mut segments = path_segments(path).collect::<Vec<_>>();
        let file_name = segments.pop().ok_or(InsertFileError::EmptyPath {
            path: path.to_string(),
        })?;
        let previous = self.file_size(path);

        let mut current = self;
        current.adjust_total(previous, size);
        for segment in segments {
            current = current
                .directories
                .entry(segment.to_string())
                .or_insert_with(|| DirectoryNode::new(segment));
            current.adjust_total(previous, size);
        }

        if let Some(old_size) = current.files.replace(file_name.to_string(), size) {
            debug!("Replaced '{}' ({} bytes) with {} bytes", path, old_size, size);
        }
        Ok(())
    }

    /// Makes sure the directory at `path` exists without touching any total
    pub fn insert_directory(&mut self, path: &str) -> &mut DirectoryNode {
        path_segments(path).fold(self, |dir, segment| {
            dir.directories
                .entry(segment.to_string())
                .or_insert_with(|| DirectoryNode::new(segment))
        })
    }

    /// Looks up the size of the file at `path`
    pub fn file_size(&self, path: &str) -> Option<u64> {
        let mut segments = path_segments(path).collect::<Vec<_>>();
        let file_name = segments.pop()?;
        let directory = segments
            .into_iter()
            .try_fold(self, |dir, segment| dir.directories.get(segment))?;
        directory.files.get(file_name).copied()
    }

    /// Looks up the directory at `path`. An empty path resolves to `self`.
    pub fn subdirectory(&self, path: &str) -> Option<&DirectoryNode> {
        path_segments(path).try_fold(self, |dir, segment| dir.directories.get(segment))
    }

    /// Sum of all file sizes below this directory, ignoring every reported
    /// total. Saturates at `u64::MAX`.
    pub fn computed_size(&self) -> u64 {
        let files = saturating_sum(self.files.values().copied());
        let directories =
            saturating_sum(self.directories.values().map(DirectoryNode::computed_size));
        files.saturating_add(directories)
    }

    /// Replaces every reported total with the size derived from the children
    /// and returns the new total of this directory.
    pub fn recompute_totals(&mut self) -> u64 {
        let directories = saturating_sum(
            self.directories
                .values_mut()
                .map(DirectoryNode::recompute_totals),
        );
        let computed = saturating_sum(self.files.values().copied()).saturating_add(directories);
        if computed != self.total_size {
            debug!(
                "Correcting total of '{}' from {} to {} bytes",
                self.name, self.total_size, computed
            );
            self.total_size = computed;
        }
        computed
    }

    fn adjust_total(&mut self, previous: Option<u64>, size: u64) {
        self.total_size = self
            .total_size
            .saturating_sub(previous.unwrap_or(0))
            .saturating_add(size);
    }
}

fn saturating_sum(sizes: impl Iterator<Item = u64>) -> u64 {
    sizes.fold(0, u64::saturating_add)
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

#[derive(Debug, Snafu)]
pub enum InsertFileError {
    #[snafu(display("Path '{}' does not name a file", path))]
    EmptyPath { path: String },
}
