use std::collections::BTreeSet;

use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filesystem::LayerSizes;

/// Image metadata as reported by the registry inspection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImageInspectInfo {
    pub tag: String,
    pub created: String,
    pub docker_version: String,
    pub labels: Option<LinkedHashMap<String, String>>,
    pub architecture: String,
    pub variant: String,
    pub os: String,
    pub layers: Vec<String>,
    pub env: Option<Vec<String>>,
}

/// An analyzed image, as handed over by the pull workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerImage {
    pub image: String,
    pub tag: String,
    pub image_digest: String,
    pub image_info: ImageInspectInfo,
}

/// Analysis result of one image content digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageHistoryEntry {
    pub tags: Vec<String>,
    pub contents: LayerSizes,
    pub inspect_info: ImageInspectInfo,
}

impl ImageHistoryEntry {
    pub fn for_image(image: &ContainerImage, contents: LayerSizes) -> Self {
        let tags = if image.tag.is_empty() {
            Vec::new()
        } else {
            vec![image.tag.clone()]
        };
        Self {
            tags,
            contents,
            inspect_info: image.image_info.clone(),
        }
    }
}

/// Every analyzed content digest of one image name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageHistory {
    /// Assigned by the store when the history is first created
    #[serde(rename = "ID")]
    pub id: Option<i64>,
    pub name: String,
    pub history: LinkedHashMap<String, ImageHistoryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Merged,
}

impl ImageHistory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            history: LinkedHashMap::new(),
        }
    }

    /// Records `entry` under `digest`. An existing entry keeps the union of
    /// both tag lists (sorted) and takes everything else from `entry`.
    pub fn upsert(&mut self, digest: &str, entry: ImageHistoryEntry) -> UpsertOutcome {
        match self.history.get_mut(digest) {
            Some(existing) => {
                let tags = existing
                    .tags
                    .drain(..)
                    .chain(entry.tags)
                    .collect::<BTreeSet<_>>();
                existing.tags = tags.into_iter().collect();
                existing.contents = entry.contents;
                existing.inspect_info = entry.inspect_info;
                debug!(
                    "Merged digest {} of '{}', tags: {:?}",
                    digest, self.name, existing.tags
                );
                UpsertOutcome::Merged
            }
            None => {
                self.history.insert(digest.to_string(), entry);
                debug!("Added digest {} to '{}'", digest, self.name);
                UpsertOutcome::Inserted
            }
        }
    }
}
