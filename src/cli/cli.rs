use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::application::data::{ColorChoice, CompareFormat, LogLevel, Side};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Disk usage of container image layers")]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum, global = true)]
    pub log_level: LogLevel,

    /// The directory holding `layerdu.yaml`
    #[clap(long, short, default_value = ".", global = true)]
    pub root: PathBuf,

    #[clap(long, default_value = "auto", value_enum, global = true)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the sunburst trace of a tree
    Flatten {
        input: PathBuf,
        #[clap(long)]
        layer: Option<String>,
        /// Directory levels to include, 0 or less for all
        #[clap(long, allow_negative_numbers = true)]
        max_depth: Option<i64>,
    },
    /// Color two trees by how their sizes differ
    Compare {
        #[command(flatten)]
        inputs: ComparedInputs,
        #[clap(long, default_value = "json", value_enum)]
        format: CompareFormat,
        #[clap(long, allow_negative_numbers = true)]
        max_depth: Option<i64>,
    },
    /// Find the entry of one tree that matches a path in the other
    Lookup {
        #[command(flatten)]
        inputs: ComparedInputs,
        /// Slash separated path below the root, empty for the root itself
        #[clap(long)]
        path: String,
        /// Side the path is selected on
        #[clap(long, default_value = "left", value_enum)]
        from: Side,
    },
    /// List the layer digests of a tree document
    Layers { input: PathBuf },
    /// Build a tree from a local directory
    Scan {
        directory: PathBuf,
        /// Name of the root entry
        #[clap(long, default_value = "/")]
        name: String,
    },
    /// Record analyzed images and read their history back
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Args, Debug, Clone)]
pub struct ComparedInputs {
    pub left: PathBuf,
    pub right: PathBuf,
    #[clap(long)]
    pub left_layer: Option<String>,
    #[clap(long)]
    pub right_layer: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// Record an analyzed image
    Record {
        #[clap(long)]
        image: String,
        #[clap(long)]
        digest: String,
        #[clap(long, default_value = "")]
        tag: String,
        /// Tree document holding the layer sizes. A single directory tree has
        /// no layer digests and is stored as one layer keyed by `--digest`.
        #[clap(long)]
        tree: PathBuf,
        /// JSON output of `docker image inspect` for the image
        #[clap(long)]
        inspect: Option<PathBuf>,
    },
    /// Print the stored history of an image
    Show {
        #[clap(long, conflicts_with = "id", required_unless_present = "id")]
        name: Option<String>,
        #[clap(long)]
        id: Option<i64>,
    },
}
