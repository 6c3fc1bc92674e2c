//! Image history: every analyzed content digest of an image name, with the
//! merge rules applied when the same digest is analyzed again.

mod model;
mod store;

pub use model::{
    ContainerImage, ImageHistory, ImageHistoryEntry, ImageInspectInfo, UpsertOutcome,
};
pub use store::{FileHistoryStore, HistoryStore, HistoryStoreError, save_history};
