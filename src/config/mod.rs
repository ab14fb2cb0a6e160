//! Configuration management for novelrank.
//!
//! Configuration is read from `~/.config/novelrank/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! User preferences (sources, refresh interval, display flags) are not part
//! of this file; they live in the store and are edited with `novelrank settings`.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::aggregate::DEFAULT_WORKERS;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub daemon: DaemonConfig,
}

/// HTTP and fan-out settings for the providers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum provider calls in flight at once
    pub workers: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_secs: 10,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// How often the daemon checks whether the rankings are stale
    pub check_interval_minutes: u64,
    /// Whether to check immediately on start
    pub update_on_start: bool,
    /// Log file path (None = stdout)
    pub log_file: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: 60,
            update_on_start: true,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/novelrank/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("novelrank").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# novelrank configuration
#
# Which sources are aggregated, how often rankings go stale and what the
# listing shows are user settings; change them with `novelrank settings set`.

[fetch]
# Maximum provider requests in flight at once
workers = 10

# Per-request timeout in seconds
timeout_secs = 10

# User agent sent to the book sites (default: novelrank/<version>)
# user_agent = "Mozilla/5.0"

[daemon]
# How often `novelrank daemon` checks whether the rankings are stale
check_interval_minutes = 60

# Check immediately when the daemon starts
update_on_start = true

# Append daemon output to this file instead of stdout
# log_file = "/tmp/novelrank.log"
"##
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let config: Config = toml::from_str(Config::default_config_content())
            .expect("Default config should be valid TOML");

        assert_eq!(config.fetch.workers, DEFAULT_WORKERS);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.daemon.check_interval_minutes, 60);
        assert!(config.daemon.update_on_start);
        assert!(config.daemon.log_file.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[fetch]
workers = 3
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.fetch.workers, 3);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.daemon.check_interval_minutes, 60);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.fetch.workers, DEFAULT_WORKERS);
        assert!(config.fetch.user_agent.is_none());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("novelrank").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.daemon.check_interval_minutes, 60);

        fs::write(&path, "[daemon]\ncheck_interval_minutes = 15\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.daemon.check_interval_minutes, 15);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch]\nworkers = \"many\"\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
