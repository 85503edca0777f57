//! Tool configuration, read from TOML or JSON.

use samqfs_mount::UnsupportedDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// Pretty JSON.
    Json,
}

/// Settings for the `sam-mountcfg` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MgmtConfig {
    /// Directory holding one `<fs_name>.json` value snapshot per filesystem.
    pub snapshot_dir: PathBuf,
    /// Default output format.
    pub output: OutputFormat,
    /// Filesystem used when a command names none.
    pub default_fs: Option<String>,
    /// Baseline for the unsupported-option report.
    pub unsupported_defaults: UnsupportedDefaults,
}

impl Default for MgmtConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("/var/opt/SUNWsamfs/mountcfg"),
            output: OutputFormat::Text,
            default_fs: None,
            unsupported_defaults: UnsupportedDefaults::default(),
        }
    }
}

impl MgmtConfig {
    /// Reads a `.toml` or `.json` file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => {
                let config: MgmtConfig = toml::from_str(&contents)?;
                Ok(config)
            }
            "json" => {
                let config: MgmtConfig = serde_json::from_str(&contents)?;
                Ok(config)
            }
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        }
    }

    /// Reads `path` if it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!("Config file not found, using defaults: {}", path.display());
            Ok(Self::default())
        }
    }
}
