use std::io;
use std::path::PathBuf;

use compio::fs;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{debug, info};

use crate::ext::BestEffortPathExt;
use crate::filesystem::LayerSizes;
use crate::history::{ContainerImage, ImageHistory, ImageHistoryEntry, UpsertOutcome};

const COMPRESSION_LEVEL: i32 = 3;

/// Persistence of image histories, keyed by image name and by numeric id.
///
/// `create` assigns the id of a new history, `update` replaces an existing one.
pub trait HistoryStore {
    async fn fetch_by_name(&self, name: &str) -> Result<Option<ImageHistory>, HistoryStoreError>;
    async fn fetch_by_id(&self, id: i64) -> Result<Option<ImageHistory>, HistoryStoreError>;
    async fn create(&mut self, history: ImageHistory) -> Result<ImageHistory, HistoryStoreError>;
    async fn update(&mut self, history: ImageHistory) -> Result<ImageHistory, HistoryStoreError>;
}

/// Adds the analysis of `image` to the stored history of its name,
/// creating that history on first use.
pub async fn save_history<S: HistoryStore>(
    store: &mut S,
    image: &ContainerImage,
    contents: LayerSizes,
) -> Result<ImageHistory, HistoryStoreError> {
    let mut history = store
        .fetch_by_name(&image.image)
        .await?
        .unwrap_or_else(|| ImageHistory::new(image.image.as_str()));

    let entry = ImageHistoryEntry::for_image(image, contents);
    let action = match history.upsert(&image.image_digest, entry) {
        UpsertOutcome::Inserted => "Recording new",
        UpsertOutcome::Merged => "Updating",
    };
    info!("{} digest {} of '{}'", action, image.image_digest, image.image);

    match history.id {
        Some(_) => store.update(history).await,
        None => store.create(history).await,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredHistories {
    last_id: i64,
    histories: Vec<ImageHistory>,
}

/// History store kept in a single zstd-compressed bincode file
#[derive(Debug)]
pub struct FileHistoryStore {
    path: PathBuf,
    stored: StoredHistories,
}

impl FileHistoryStore {
    /// Opens the store at `path`; a missing file is an empty store
    pub async fn open(path: PathBuf) -> Result<Self, HistoryStoreError> {
        debug!("Opening history store {}", path.best_effort_path_display());
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No existing history store found, starting fresh");
                return Ok(Self {
                    path,
                    stored: StoredHistories::default(),
                });
            }
            Err(err) => {
                return Err(err).context(ReadSnafu {
                    file_path: path.best_effort_path_display(),
                });
            }
        };

        let decompressed = zstd::decode_all(bytes.as_slice()).context(DecompressSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        let (stored, _) = bincode::serde::decode_from_slice::<StoredHistories, _>(
            &decompressed,
            bincode::config::standard(),
        )
        .context(DecodeSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        debug!("Loaded {} image histories", stored.histories.len());

        Ok(Self { path, stored })
    }

    async fn persist(&self) -> Result<(), HistoryStoreError> {
        let encoded = bincode::serde::encode_to_vec(&self.stored, bincode::config::standard())
            .context(EncodeSnafu)?;
        let compressed =
            zstd::encode_all(encoded.as_slice(), COMPRESSION_LEVEL).context(CompressSnafu)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.context(WriteSnafu {
                file_path: parent.best_effort_path_display(),
            })?;
        }
        fs::write(&self.path, compressed).await.0.context(WriteSnafu {
            file_path: self.path.best_effort_path_display(),
        })?;
        debug!("Wrote history store {}", self.path.best_effort_path_display());
        Ok(())
    }
}

impl HistoryStore for FileHistoryStore {
    async fn fetch_by_name(&self, name: &str) -> Result<Option<ImageHistory>, HistoryStoreError> {
        Ok(self
            .stored
            .histories
            .iter()
            .find(|history| history.name == name)
            .cloned())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<ImageHistory>, HistoryStoreError> {
        Ok(self
            .stored
            .histories
            .iter()
            .find(|history| history.id == Some(id))
            .cloned())
    }

    async fn create(&mut self, mut history: ImageHistory) -> Result<ImageHistory, HistoryStoreError> {
        if self.fetch_by_name(&history.name).await?.is_some() {
            return DuplicateNameSnafu { name: history.name }.fail();
        }

        self.stored.last_id += 1;
        history.id = Some(self.stored.last_id);
        self.stored.histories.push(history.clone());
        self.persist().await?;
        info!("Created history {:?} for '{}'", history.id, history.name);
        Ok(history)
    }

    async fn update(&mut self, history: ImageHistory) -> Result<ImageHistory, HistoryStoreError> {
        let id = history.id.context(MissingIdSnafu {
            name: history.name.as_str(),
        })?;
        let slot = self
            .stored
            .histories
            .iter_mut()
            .find(|stored| stored.id == Some(id))
            .context(UnknownIdSnafu { id })?;

        *slot = history.clone();
        self.persist().await?;
        info!("Updated history {} for '{}'", id, history.name);
        Ok(history)
    }
}

#[derive(Debug, Snafu)]
pub enum HistoryStoreError {
    #[snafu(display("Failed to read the history store: {}", file_path))]
    ReadError {
        file_path: String,
        source: io::Error,
    },
    #[snafu(display("Failed to write the history store: {}", file_path))]
    WriteError {
        file_path: String,
        source: io::Error,
    },
    #[snafu(display("Failed to decompress the history store: {}", file_path))]
    DecompressError {
        file_path: String,
        source: io::Error,
    },
    #[snafu(display("Failed to compress the history store"))]
    CompressError { source: io::Error },
    #[snafu(display("Failed to decode the history store: {}", file_path))]
    DecodeError {
        file_path: String,
        source: bincode::error::DecodeError,
    },
    #[snafu(display("Failed to encode the history store"))]
    EncodeError {
        source: bincode::error::EncodeError,
    },
    #[snafu(display("A history for '{}' already exists", name))]
    DuplicateName { name: String },
    #[snafu(display("The history for '{}' has no id and cannot be updated", name))]
    MissingId { name: String },
    #[snafu(display("No history with id {}", id))]
    UnknownId { id: i64 },
}
