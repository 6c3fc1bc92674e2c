use std::path::{Component, Path, PathBuf};

use snafu::{ResultExt, Snafu};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::ext::BestEffortPathExt;
use crate::filesystem::{DirectoryNode, InsertFileError};

/// Builds the size tree of a local directory. Symbolic links are recorded as
/// entries of their own and never followed; entries are visited in file name order.
pub fn scan_directory(root: &Path, name: &str) -> Result<DirectoryNode, ScanError> {
    info!("Scanning {}", root.best_effort_path_display());
    let mut tree = DirectoryNode::new(name);

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry.context(WalkSnafu {
            root: root.to_path_buf(),
        })?;
        let relative = relative_tree_path(root, entry.path());

        if entry.file_type().is_dir() {
            tree.insert_directory(&relative);
            continue;
        }

        let size = entry
            .metadata()
            .context(WalkSnafu {
                root: root.to_path_buf(),
            })?
            .len();
        tree.insert_file(&relative, size).context(InsertSnafu)?;
    }

    debug!(
        "Scanned {} bytes below {}",
        tree.total_size,
        root.best_effort_path_display()
    );
    Ok(tree)
}

fn relative_tree_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Snafu)]
pub enum ScanError {
    #[snafu(display("Failed to walk {}", root.best_effort_path_display()))]
    WalkError {
        root: PathBuf,
        source: walkdir::Error,
    },
    #[snafu(display("Failed to record a scanned file"))]
    InsertError { source: InsertFileError },
}
