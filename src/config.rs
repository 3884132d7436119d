use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::history::PersistenceMode;

const APP_NAME: &str = "clip-exporter";

#[derive(Parser)]
#[command(name = "clip-exporter", about = "Record copied text and export it")]
pub struct Cli {
    /// Path to config file (overrides default location)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Persistence mode (overrides the config file)
    #[arg(short, long, value_enum)]
    pub mode: Option<PersistenceMode>,

    /// Start with monitoring already enabled
    #[arg(long)]
    pub enabled: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Open the terminal UI (default)
    Run,
    /// Print the recorded history to stdout
    Show,
    /// Write the recorded history to a file
    Export {
        /// Destination file. Defaults to a timestamped file in the export directory.
        path: Option<PathBuf>,
    },
    /// Erase the recorded history
    Clear,
    /// Write the default config file if it does not exist yet
    InitConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Where captured text lives: "transient-buffer", "file-append-mirrored",
    /// "file-append-only" or "in-memory-list".
    #[serde(default)]
    pub mode: PersistenceMode,
    /// Backing history file. Empty means use platform default.
    #[serde(default)]
    pub store_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for timestamped exports. Empty means the user's documents folder.
    #[serde(default)]
    pub export_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Whether monitoring is on at startup.
    #[serde(default)]
    pub start_enabled: bool,
    /// How often the clipboard is checked for changes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Skip the change caused by copying the history back to the clipboard.
    #[serde(default = "default_true")]
    pub ignore_self_writes: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            mode: PersistenceMode::default(),
            store_path: String::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            export_dir: String::new(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            start_enabled: false,
            poll_interval_ms: default_poll_interval_ms(),
            ignore_self_writes: true,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from the given path (or the standard path if `None`).
    /// Returns defaults if the file does not exist or cannot be parsed.
    pub fn load(override_path: Option<&Path>) -> Self {
        let path = match override_path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path(),
        };
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        tracing::warn!("failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("failed to read config at {}: {e}", path.display());
                }
            }
        }
        Self::default()
    }

    /// Apply command-line overrides on top of the loaded file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(mode) = cli.mode {
            self.history.mode = mode;
        }
        if cli.enabled {
            self.monitor.start_enabled = true;
        }
    }

    /// The standard config file path, e.g. ~/.config/clip-exporter/config.toml
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Platform data directory; holds the history file and the log.
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve the backing history file (uses platform data dir if not configured).
    pub fn store_path(&self) -> PathBuf {
        if !self.history.store_path.is_empty() {
            return PathBuf::from(&self.history.store_path);
        }
        Self::data_dir().join("clipboard.txt")
    }

    /// Resolve the export directory.
    /// Defaults to the user's documents folder if not configured.
    pub fn export_dir(&self) -> PathBuf {
        if !self.storage.export_dir.is_empty() {
            return PathBuf::from(&self.storage.export_dir);
        }
        if let Some(user_dirs) = directories::UserDirs::new() {
            if let Some(docs) = user_dirs.document_dir() {
                return docs.to_path_buf();
            }
        }
        Self::data_dir().join("exports")
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.monitor.poll_interval_ms.max(10))
    }

    /// Write the default config to disk if it doesn't exist.
    /// Returns `true` if a file was written.
    pub fn write_default_if_missing(path: &Path) -> std::io::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut cfg = Config::default();
        // Pre-fill paths with the resolved defaults so users can discover & edit them
        cfg.history.store_path = cfg.store_path().to_string_lossy().to_string();
        cfg.storage.export_dir = cfg.export_dir().to_string_lossy().to_string();
        let default_toml = toml::to_string_pretty(&cfg)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, default_toml)?;
        Ok(true)
    }
}

/// File name for an export taken at `now`: `yyyy-MM-dd-HH-mm-ss-fff.txt`.
pub fn default_export_name(now: DateTime<Local>) -> String {
    format!("{}.txt", now.format("%Y-%m-%d-%H-%M-%S-%3f"))
}
