use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, info};

use crate::ext::BestEffortPathExt;

const SETTINGS_FILE_NAME: &str = "layerdu.yaml";
const DEFAULT_MAX_DEPTH: i64 = 5;
const DEFAULT_HISTORY_FILE: &str = ".layerdu/history.bin.zst";

fn get_settings_file_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE_NAME)
}

/// Project settings read from `layerdu.yaml`; every key is optional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory levels shown by `flatten` and the comparison summary, 0 or less for all
    pub max_depth: i64,
    pub history_file: PathBuf,
    /// Derive directory totals from their children instead of trusting the input
    pub recompute_totals: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            recompute_totals: false,
        }
    }
}

impl Settings {
    pub async fn read(root: &Path) -> Result<Self, SettingsError> {
        let path = get_settings_file_path(root);
        debug!("Opening settings file: {}", path.best_effort_path_display());

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No settings file found, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).context(ReadSnafu {
                    file_path: path.best_effort_path_display(),
                });
            }
        };
        debug!("Successfully read settings file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        contents.as_str().try_into()
    }

    fn from_mapping(top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, SettingsError> {
        let defaults = Self::default();

        Ok(Settings {
            max_depth: read_integer(top_level, "max_depth")?.unwrap_or(defaults.max_depth),
            history_file: read_string(top_level, "history_file")?
                .map(PathBuf::from)
                .unwrap_or(defaults.history_file),
            recompute_totals: read_bool(top_level, "recompute_totals")?
                .unwrap_or(defaults.recompute_totals),
        })
    }
}

impl TryFrom<&str> for Settings {
    type Error = SettingsError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let Some(document) = documents.first() else {
            return Ok(Self::default());
        };

        match document {
            Yaml::Mapping(top_level) => Self::from_mapping(top_level),
            Yaml::Value(Scalar::Null) => Ok(Self::default()),
            _ => TopLevelNotMapSnafu.fail(),
        }
    }
}

fn lookup<'a, 'input>(
    top_level: &'a LinkedHashMap<Yaml<'input>, Yaml<'input>>,
    key: &'static str,
) -> Option<&'a Yaml<'input>> {
    top_level
        .get(&Yaml::Value(Scalar::String(Cow::Borrowed(key))))
        .filter(|value| !matches!(value, Yaml::Value(Scalar::Null)))
}

fn read_integer(
    top_level: &LinkedHashMap<Yaml, Yaml>,
    key: &'static str,
) -> Result<Option<i64>, SettingsError> {
    match lookup(top_level, key) {
        None => Ok(None),
        Some(Yaml::Value(Scalar::Integer(value))) => Ok(Some(*value)),
        Some(_) => InvalidValueSnafu {
            key,
            expected: "an integer",
        }
        .fail(),
    }
}

fn read_bool(
    top_level: &LinkedHashMap<Yaml, Yaml>,
    key: &'static str,
) -> Result<Option<bool>, SettingsError> {
    match lookup(top_level, key) {
        None => Ok(None),
        Some(Yaml::Value(Scalar::Boolean(value))) => Ok(Some(*value)),
        Some(_) => InvalidValueSnafu {
            key,
            expected: "a boolean",
        }
        .fail(),
    }
}

fn read_string(
    top_level: &LinkedHashMap<Yaml, Yaml>,
    key: &'static str,
) -> Result<Option<String>, SettingsError> {
    match lookup(top_level, key) {
        None => Ok(None),
        Some(Yaml::Value(Scalar::String(value))) => Ok(Some(value.to_string())),
        Some(_) => InvalidValueSnafu {
            key,
            expected: "a string",
        }
        .fail(),
    }
}

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("Failed to read the settings file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The settings file is not valid UTF-8: {}", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the settings file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of the settings file should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Setting '{}' should be {}", key, expected))]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[compio::test]
    async fn settings_default_when_file_is_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let settings = Settings::read(temp_dir.path()).await.unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_depth, 5);
    }

    #[compio::test]
    async fn settings_are_read_from_the_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(
            temp_dir.path().join(SETTINGS_FILE_NAME),
            "max_depth: 3\nhistory_file: /var/lib/layerdu/history\nrecompute_totals: true\n",
        )
        .unwrap();

        let settings = Settings::read(temp_dir.path()).await.unwrap();

        assert_eq!(settings.max_depth, 3);
        assert_eq!(settings.history_file, PathBuf::from("/var/lib/layerdu/history"));
        assert!(settings.recompute_totals);
    }

    #[compio::test]
    async fn settings_reject_invalid_utf8() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(
            temp_dir.path().join(SETTINGS_FILE_NAME),
            b"history_file: \xff\xfe\n",
        )
        .unwrap();

        let result = Settings::read(temp_dir.path()).await;

        assert!(matches!(result, Err(SettingsError::EncodingError { .. })));
    }

    #[test]
    fn settings_handle_empty_file() {
        let result: Result<Settings, _> = "".try_into();

        assert_eq!(result.unwrap(), Settings::default());
    }

    #[test]
    fn settings_fill_missing_keys_with_defaults() {
        let result: Result<Settings, _> = "max_depth: -1".try_into();

        let settings = result.unwrap();
        assert_eq!(settings.max_depth, -1);
        assert_eq!(settings.history_file, PathBuf::from(DEFAULT_HISTORY_FILE));
        assert!(!settings.recompute_totals);
    }

    #[test]
    fn settings_treat_null_values_as_missing() {
        let result: Result<Settings, _> = "max_depth:\nhistory_file: ~".try_into();

        assert_eq!(result.unwrap(), Settings::default());
    }

    #[test]
    fn settings_ignore_unknown_keys() {
        let result: Result<Settings, _> = "theme: dark\nmax_depth: 2".try_into();

        assert_eq!(result.unwrap().max_depth, 2);
    }

    #[test]
    fn settings_return_error_on_invalid_yaml() {
        let result: Result<Settings, _> = "invalid: yaml: content: [unclosed".try_into();

        assert!(matches!(result, Err(SettingsError::ParseError { .. })));
    }

    #[test]
    fn settings_return_error_when_top_level_is_not_map() {
        let result: Result<Settings, _> = "- item1\n- item2".try_into();

        assert!(matches!(result, Err(SettingsError::TopLevelNotMap)));
    }

    #[test]
    fn settings_return_error_on_wrong_value_type() {
        let result: Result<Settings, _> = "max_depth: deep".try_into();

        assert!(matches!(
            result,
            Err(SettingsError::InvalidValue {
                key: "max_depth",
                ..
            })
        ));
    }

    #[test]
    fn settings_reject_non_boolean_recompute_flag() {
        let result: Result<Settings, _> = "recompute_totals: 1".try_into();

        assert!(matches!(
            result,
            Err(SettingsError::InvalidValue {
                key: "recompute_totals",
                expected: "a boolean"
            })
        ));
    }
}
