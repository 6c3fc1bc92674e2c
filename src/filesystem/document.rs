use std::path::Path;

use compio::fs;
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use tracing::{debug, warn};

use crate::ext::{AsyncTryFrom, BestEffortPathExt};
use crate::filesystem::DirectoryNode;

/// Size trees of all layers of an image, keyed by layer digest
pub type LayerSizes = LinkedHashMap<String, DirectoryNode>;

/// Contents of a tree input file: either a single directory tree or the
/// backend's per-layer reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeDocument {
    Directory(DirectoryNode),
    Layers(LayerSizes),
}

impl TreeDocument {
    /// Decodes a JSON document without a nesting limit, so that deep
    /// filesystem layouts load.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        deserializer.disable_recursion_limit();
        let document = Self::deserialize(&mut deserializer)?;
        deserializer.end()?;
        Ok(document)
    }

    pub fn layer_digests(&self) -> Vec<&str> {
        match self {
            TreeDocument::Directory(_) => Vec::new(),
            TreeDocument::Layers(layers) => layers.keys().map(String::as_str).collect(),
        }
    }

    /// Picks the tree to work on. A layer map needs a digest unless it holds exactly one layer.
    pub fn select(self, layer: Option<&str>) -> Result<DirectoryNode, LayerSelectionError> {
        match (self, layer) {
            (TreeDocument::Directory(root), None) => Ok(root),
            (TreeDocument::Directory(root), Some(digest)) => {
                warn!(
                    "Ignoring layer '{}': the document holds a single directory tree",
                    digest
                );
                Ok(root)
            }
            (TreeDocument::Layers(mut layers), Some(digest)) => {
                layers
                    .remove(digest)
                    .ok_or_else(|| LayerSelectionError::LayerNotFound {
                        digest: digest.to_string(),
                        available: layers.keys().cloned().collect(),
                    })
            }
            (TreeDocument::Layers(mut layers), None) => {
                if layers.len() == 1 {
                    if let Some((digest, root)) = layers.pop_front() {
                        debug!("Using the only layer in the document: {}", digest);
                        return Ok(root);
                    }
                }
                Err(LayerSelectionError::AmbiguousLayer {
                    available: layers.keys().cloned().collect(),
                })
            }
        }
    }
}

impl AsyncTryFrom<&Path> for TreeDocument {
    type Error = DocumentError;

    async fn async_try_from(path: &Path) -> Result<Self, Self::Error> {
        debug!("Reading tree document {}", path.best_effort_path_display());
        let bytes = fs::read(path).await.context(ReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        debug!("Read {} bytes", bytes.len());

        Self::from_slice(&bytes).context(DecodeSnafu {
            file_path: path.best_effort_path_display(),
        })
    }
}

#[derive(Debug, Snafu)]
pub enum DocumentError {
    #[snafu(display("Failed to read the tree document: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to decode the tree document: {}", file_path))]
    DecodeError {
        file_path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Snafu)]
pub enum LayerSelectionError {
    #[snafu(display("Layer '{}' not found, available layers: {:?}", digest, available))]
    LayerNotFound {
        digest: String,
        available: Vec<String>,
    },
    #[snafu(display("The document holds several layers, pick one of: {:?}", available))]
    AmbiguousLayer { available: Vec<String> },
}
