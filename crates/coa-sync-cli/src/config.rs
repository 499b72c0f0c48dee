use anyhow::{Context, Result};
use coa_sync::writer::{FailurePolicy, WriteConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSource {
    pub file: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigTarget {
    pub ledger: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSync {
    #[serde(default)]
    pub on_write_error: FailurePolicy,
    #[serde(default)]
    pub strict_categories: bool,
}

impl From<&ConfigSync> for WriteConfig {
    fn from(sync: &ConfigSync) -> Self {
        WriteConfig {
            on_error: sync.on_write_error,
            strict_categories: sync.strict_categories,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLog {
    /// `tracing` filter directives, used when `RUST_LOG` is not set.
    pub filter: Option<String>,
    /// Audit log file. Lines are appended.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub source: Option<ConfigSource>,
    pub target: Option<ConfigTarget>,
    #[serde(default)]
    pub sync: ConfigSync,
    #[serde(default)]
    pub log: ConfigLog,
}

const CONFIG_FILE_NAMES: [&str; 2] = ["coa-sync.toml", ".coa-sync.toml"];

impl Config {
    /// Parses `path`, returning the directory that relative paths resolve against.
    pub fn load_from_file(path: &Path) -> Result<(PathBuf, Self)> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok((base_dir, config))
    }

    /// Looks for a config file in the working directory.
    pub fn find_and_load() -> Result<Option<(PathBuf, Self)>> {
        CONFIG_FILE_NAMES
            .into_iter()
            .map(Path::new)
            .find(|path| path.is_file())
            .map(Self::load_from_file)
            .transpose()
    }
}
