use std::path::Path;

use compio::fs;
use futures::try_join;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::RuntimeConfig;
use crate::application::data::{CompareFormat, Side};
use crate::cli::{Command, ComparedInputs, HistoryCommand};
use crate::comparison::{
    ChartTree, ComparisonNode, find_corresponding, path_from_root, render_summary,
};
use crate::config::{Settings, SettingsError};
use crate::ext::{AsyncTryInto, BestEffortPathExt, SizeFormatError};
use crate::filesystem::{
    DirectoryNode, DocumentError, LayerSelectionError, LayerSizes, ScanError, TreeDocument,
    scan_directory,
};
use crate::history::{
    ContainerImage, FileHistoryStore, HistoryStore, HistoryStoreError, ImageInspectInfo,
    save_history,
};
use crate::sunburst::{FlatChart, SunburstTrace};

pub struct Application {
    config: RuntimeConfig,
    settings: Settings,
}

/// Both sides of a comparison, `null` where a side is missing
#[derive(Debug, Serialize)]
struct ComparedViews<'a> {
    left: Option<&'a ComparisonNode>,
    right: Option<&'a ComparisonNode>,
}

/// `docker image inspect` prints an array, a bare object is accepted as well
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InspectOutput {
    Many(Vec<ImageInspectInfo>),
    Single(ImageInspectInfo),
}

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        colored::control::set_override(app_config.color.should_colorize());

        let settings = Settings::read(&app_config.root)
            .await
            .context(SettingsSnafu)?;
        debug!("Loaded settings: {:?}", settings);

        let command = app_config.command.clone();
        let application = Application {
            config: app_config,
            settings,
        };

        let output = match command {
            Command::Flatten {
                input,
                layer,
                max_depth,
            } => application.flatten(&input, layer.as_deref(), max_depth).await?,
            Command::Compare {
                inputs,
                format,
                max_depth,
            } => application.compare(&inputs, format, max_depth).await?,
            Command::Lookup { inputs, path, from } => {
                application.lookup(&inputs, &path, from).await?
            }
            Command::Layers { input } => application.layers(&input).await?,
            Command::Scan { directory, name } => application.scan(&directory, &name)?,
            Command::History(command) => application.history(command).await?,
        };

        println!("{output}");
        Ok(())
    }

    async fn flatten(
        &self,
        input: &Path,
        layer: Option<&str>,
        max_depth: Option<i64>,
    ) -> Result<String, ApplicationError> {
        let root = self.load_tree(input, layer).await?;
        let limit = RuntimeConfig::depth_limit(max_depth, &self.settings);

        let chart = FlatChart::from_directory(&root, limit);
        info!("Flattened '{}' into {} rows ({:?})", root.name, chart.len(), limit);

        serde_json::to_string(&SunburstTrace::new(chart)).context(SerializeSnafu)
    }

    async fn compare(
        &self,
        inputs: &ComparedInputs,
        format: CompareFormat,
        max_depth: Option<i64>,
    ) -> Result<String, ApplicationError> {
        let (left, right) = self.load_both(inputs).await?;
        let (left, right) = crate::comparison::compare(Some(&left), Some(&right));

        match format {
            CompareFormat::Json => {
                let views = ComparedViews {
                    left: left.as_ref(),
                    right: right.as_ref(),
                };
                serde_json::to_string(&views).context(SerializeSnafu)
            }
            CompareFormat::Summary => {
                let limit = RuntimeConfig::depth_limit(max_depth, &self.settings);
                let mut sections = Vec::new();
                for (side, view) in [(&inputs.left, &left), (&inputs.right, &right)] {
                    if let Some(view) = view {
                        let summary = render_summary(view, limit).context(SizeFormatSnafu)?;
                        sections.push(format!("{}\n{}", side.best_effort_path_display(), summary));
                    }
                }
                Ok(sections.join("\n\n"))
            }
        }
    }

    async fn lookup(
        &self,
        inputs: &ComparedInputs,
        path: &str,
        from: Side,
    ) -> Result<String, ApplicationError> {
        let (left, right) = self.load_both(inputs).await?;
        let (left, right) = crate::comparison::compare(Some(&left), Some(&right));
        let (selected, other) = match from {
            Side::Left => (left, right),
            Side::Right => (right, left),
        };

        let found = match (&selected, &other) {
            (Some(selected), Some(other)) => {
                let chart = ChartTree::new(selected);
                debug!("Indexed {} chart entries on the {:?} side", chart.len(), from);
                match chart.locate(path) {
                    Some(position) => {
                        debug!(
                            "Selected /{} ({:?} bytes)",
                            path_from_root(&position).join("/"),
                            position.node().subtree_size()
                        );
                        find_corresponding(&position, other)
                    }
                    None => {
                        warn!("Path '{}' does not exist on the {:?} side", path, from);
                        None
                    }
                }
            }
            _ => None,
        };

        if found.is_none() {
            warn!("No corresponding entry for '{}'", path);
        }
        serde_json::to_string(&found).context(SerializeSnafu)
    }

    async fn layers(&self, input: &Path) -> Result<String, ApplicationError> {
        let document = Self::load_document(input).await?;
        let digests = document.layer_digests();
        if digests.is_empty() {
            info!(
                "{} holds a single directory tree",
                input.best_effort_path_display()
            );
        }
        Ok(digests.join("\n"))
    }

    fn scan(&self, directory: &Path, name: &str) -> Result<String, ApplicationError> {
        let mut root = scan_directory(directory, name).context(ScanSnafu)?;
        if self.settings.recompute_totals {
            root.recompute_totals();
        }
        serde_json::to_string(&root).context(SerializeSnafu)
    }

    async fn history(&self, command: HistoryCommand) -> Result<String, ApplicationError> {
        let mut store = FileHistoryStore::open(self.config.history_file(&self.settings))
            .await
            .context(HistorySnafu)?;

        match command {
            HistoryCommand::Record {
                image,
                digest,
                tag,
                tree,
                inspect,
            } => {
                let contents = match Self::load_document(&tree).await? {
                    TreeDocument::Layers(layers) => layers,
                    TreeDocument::Directory(root) => {
                        info!("Storing the single tree as layer {}", digest);
                        let mut layers = LayerSizes::new();
                        layers.insert(digest.clone(), root);
                        layers
                    }
                };
                let image_info = match inspect {
                    Some(path) => Self::load_inspect_info(&path).await?,
                    None => ImageInspectInfo::default(),
                };
                let image = ContainerImage {
                    image,
                    tag,
                    image_digest: digest,
                    image_info,
                };

                let history = save_history(&mut store, &image, contents)
                    .await
                    .context(HistorySnafu)?;
                Ok(format!(
                    "{} #{}: {} digests",
                    history.name,
                    history.id.unwrap_or_default(),
                    history.history.len()
                ))
            }
            HistoryCommand::Show { name, id } => {
                let history = match (name, id) {
                    (Some(name), _) => store.fetch_by_name(&name).await,
                    (None, Some(id)) => store.fetch_by_id(id).await,
                    (None, None) => Ok(None),
                }
                .context(HistorySnafu)?;

                if history.is_none() {
                    warn!("No history recorded for the requested image");
                }
                serde_json::to_string(&history).context(SerializeSnafu)
            }
        }
    }

    async fn load_document(input: &Path) -> Result<TreeDocument, ApplicationError> {
        AsyncTryInto::<TreeDocument>::async_try_into(input)
            .await
            .context(DocumentSnafu)
    }

    async fn load_tree(
        &self,
        input: &Path,
        layer: Option<&str>,
    ) -> Result<DirectoryNode, ApplicationError> {
        let mut root = Self::load_document(input)
            .await?
            .select(layer)
            .context(LayerSelectionSnafu)?;
        if self.settings.recompute_totals {
            root.recompute_totals();
        }
        Ok(root)
    }

    async fn load_both(
        &self,
        inputs: &ComparedInputs,
    ) -> Result<(DirectoryNode, DirectoryNode), ApplicationError> {
        try_join!(
            self.load_tree(&inputs.left, inputs.left_layer.as_deref()),
            self.load_tree(&inputs.right, inputs.right_layer.as_deref()),
        )
    }

    async fn load_inspect_info(path: &Path) -> Result<ImageInspectInfo, ApplicationError> {
        let bytes = fs::read(path).await.context(InspectReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        let output: InspectOutput =
            serde_json::from_slice(&bytes).context(InspectDecodeSnafu {
                file_path: path.best_effort_path_display(),
            })?;

        match output {
            InspectOutput::Single(info) => Ok(info),
            InspectOutput::Many(infos) => infos.into_iter().next().context(EmptyInspectSnafu {
                file_path: path.best_effort_path_display(),
            }),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while reading settings"))]
    SettingsError { source: SettingsError },
    #[snafu(display("Critical failure encountered while loading a tree"))]
    DocumentError { source: DocumentError },
    #[snafu(display("Critical failure encountered while selecting a layer"))]
    LayerSelectionError { source: LayerSelectionError },
    #[snafu(display("Critical failure encountered while scanning a directory"))]
    ScanError { source: ScanError },
    #[snafu(display("Critical failure encountered while formatting a size"))]
    SizeFormatError { source: SizeFormatError },
    #[snafu(display("Critical failure encountered while accessing the history store"))]
    HistoryError { source: HistoryStoreError },
    #[snafu(display("Failed to read the inspect output: {}", file_path))]
    InspectReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to decode the inspect output: {}", file_path))]
    InspectDecodeError {
        file_path: String,
        source: serde_json::Error,
    },
    #[snafu(display("The inspect output holds no image: {}", file_path))]
    EmptyInspectError { file_path: String },
    #[snafu(display("Failed to serialize the output"))]
    SerializeError { source: serde_json::Error },
}
