use std::path::PathBuf;

use crate::application::data::ColorChoice;
use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::sunburst::DepthLimit;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub root: PathBuf,
    pub color: ColorChoice,
    pub command: Command,
}

impl RuntimeConfig {
    /// Depth limit for a command, the flag taking precedence over the settings file
    pub fn depth_limit(flag: Option<i64>, settings: &Settings) -> DepthLimit {
        flag.unwrap_or(settings.max_depth).into()
    }

    /// History file location; relative paths are resolved against the root
    pub fn history_file(&self, settings: &Settings) -> PathBuf {
        self.root.join(&settings.history_file)
    }
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            root: cli.root,
            color: cli.color,
            command: cli.command,
        }
    }
}
