//! Configuration management for Feedstash.
//!
//! Configuration is read from `~/.config/feedstash/config.toml` (or the path
//! given with `--config`). Every field is optional; command-line flags
//! override whatever the file sets.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::app::Result;
use crate::export::default_snapshot_path;
use crate::poller::parse_interval;

/// Feeds polled when neither the config file nor the command line name any.
pub const DEFAULT_FEEDS: [&str; 8] = [
    "https://data.gmanetwork.com/gno/rss/news/regions/feed.xml",
    "https://tonite.abante.com.ph/feed/",
    "https://philnews.ph/feed/",
    "https://www.rappler.com/feed/",
    "https://www.inquirer.net/fullfeed/",
    "https://pilipinasdaily.com/feed/",
    "https://www.mindanaotimes.com.ph/feed/",
    "https://visayandailystar.com/feed/",
];

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub feeds: Vec<String>,
    pub poll: PollSettings,
    pub storage: StorageSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            poll: PollSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollSettings {
    /// Seconds, or a suffixed value such as "5m", "1h", "1d".
    pub interval: String,
    pub timeout_secs: u64,
    pub initial_snapshot: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: "300".into(),
            timeout_secs: 20,
            initial_snapshot: true,
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Result<Duration> {
        parse_interval(&self.interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageSettings {
    pub db_path: PathBuf,
    /// Defaults to `rss_items.jsonl` beside the database when unset or empty.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: Path::new("data").join("rss_items.db"),
            snapshot_path: None,
        }
    }
}

impl StorageSettings {
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| default_snapshot_path(&self.db_path))
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing file at the default location
    /// yields the default configuration.
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_config_path()?;
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/feedstash/config.toml`
    pub fn default_config_path() -> std::result::Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedstash").join("config.toml"))
    }

    /// Create a default config file with comments. Refuses to overwrite.
    pub fn write_default(path: &Path) -> std::result::Result<(), ConfigError> {
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(io_err)?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(io_err)?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        let feeds = DEFAULT_FEEDS
            .iter()
            .map(|f| format!("    \"{}\",\n", f))
            .collect::<String>();

        format!(
            r##"# Feedstash Configuration
#
# Feeds are polled in the order listed, once per interval.
feeds = [
{feeds}]

[poll]
# Seconds between cycles, or a suffixed value: "90s", "5m", "1h", "1d"
interval = "300"

# HTTP timeout per feed request, in seconds
timeout_secs = 20

# Write the JSONL snapshot once at startup, before the first cycle
initial_snapshot = true

[storage]
# SQLite database holding every item ever seen
db_path = "data/rss_items.db"

# JSONL snapshot, rewritten after any cycle that stores new items.
# Defaults to rss_items.jsonl beside the database.
# snapshot_path = "data/rss_items.jsonl"
"##
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
