//! Configuration management for Montage.
//!
//! Configuration is read from `~/.config/montage/config.toml` by default.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod client;
pub mod plan;

pub use client::{CircuitBreakerConfig, ClientConfig};
pub use plan::{ContinuationPlan, FragmentPlan, PagePlan, Strategy};

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_CLIENT: &str = "default";

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fragment groups a page runs at the same time
    pub workers: usize,

    /// Emit every trace event as a debug log record
    pub log_trace_events: bool,

    /// Named backend clients, referenced by providers
    pub clients: HashMap<String, ClientConfig>,

    /// Page plan executed by the command line
    pub page: PagePlan,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            log_trace_events: false,
            clients: HashMap::from([(DEFAULT_CLIENT.to_string(), ClientConfig::default())]),
            page: PagePlan::default(),
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

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/montage/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("montage").join("config.toml"))
    }

    pub fn client(&self, name: &str) -> Option<&ClientConfig> {
        self.clients.get(name)
    }

    /// Create a default config file with comments.
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

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# Montage Configuration

# Fragment groups fetched at the same time
workers = 10

# Log every trace event at debug level (RUST_LOG=montage=debug)
log_trace_events = false

# Backend clients are referenced by name from the page plan.
[clients.default]
connect_timeout_ms = 500
read_timeout_ms = 2000

# Additional attempts after a failed one (server errors and transport
# failures only, client errors are never retried)
retries = 1

# Guard calls with a circuit breaker; required for fallbacks
resilient = true

[clients.default.circuit_breaker]
failure_threshold = 5
open_timeout_ms = 5000

# Example page plan:
#
# [[page.fragments]]
# position = "header"
# strategy = "quickest"          # single | quickest | first | all
# client = "default"
# urls = ["http://mirror-a/header", "http://mirror-b/header"]
# fallback = "<header></header>"
#
# [[page.fragments]]
# position = "product"
# urls = ["http://products/{id}"]
#
# [page.fragments.continuation]
# parameter = "sku"
# json_pointer = "/sku"
#
# [[page.fragments.continuation.fragments]]
# position = "price"
# urls = ["http://prices/{sku}"]
"##
        .to_string()
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
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.workers, 10);
        assert_eq!(config.client(DEFAULT_CLIENT), Some(&ClientConfig::default()));
        assert!(config.page.fragments.is_empty());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
workers = 4

[clients.search]
retries = 0
resilient = false
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.workers, 4);
        let search = config.client("search").unwrap();
        assert!(!search.resilient);
        assert_eq!(search.retries, 0);
        assert_eq!(search.read_timeout_ms, 2000);
        assert!(config.client(DEFAULT_CLIENT).is_none());
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert!(config.client(DEFAULT_CLIENT).is_some());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[[page.fragments]]
position = "header"
urls = ["http://example.com/header"]
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.page.fragments.len(), 1);
        assert_eq!(config.page.fragments[0].position, "header");
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "workers = \"many\"").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
