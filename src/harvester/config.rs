//! Configuration loading for the harvester
//!
//! Optional TOML file with the ambient settings (paths, pool sizes, HTTP
//! identity, logging); a missing file means defaults. Per-run options
//! (keyword, limit, output directory) come from the CLI and override the
//! file where they overlap.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::harvester::pool::DEFAULT_CONCURRENCY;

/// Error types for config loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Paths {
    pub output_directory: String,
    pub log_directory: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Pools {
    pub max_download_concurrency: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Http {
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    pub log_level: String,
    pub log_to_file: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub paths: Paths,
    pub pools: Pools,
    pub http: Http,
    pub logging: Logging,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: Paths {
                output_directory: "./bing".to_string(),
                log_directory: "./logs".to_string(),
            },
            pools: Pools {
                max_download_concurrency: DEFAULT_CONCURRENCY,
            },
            http: Http {
                // Image hosts reject obviously non-browser clients.
                user_agent: "Mozilla/5.0 (X11; Fedora; Linux x86_64; rv:60.0) \
                             Gecko/20100101 Firefox/60.0"
                    .to_string(),
                timeout_secs: 2,
            },
            logging: Logging {
                log_level: "info".to_string(),
                log_to_file: true,
            },
        }
    }
}

impl AppConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Fully resolved settings for one harvest session (one output directory).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub output_dir: PathBuf,
    /// Global cap on processed URLs; `None` means unbounded.
    pub limit: Option<usize>,
    pub concurrency: usize,
    /// Optional `qft` search-filter string passed to the backend.
    pub filter: Option<String>,
    /// Subject reference date (RFC 3339) handed to the labeler.
    pub reference_date: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl SessionConfig {
    pub fn from_app_config(app: &AppConfig, reference_date: String) -> Self {
        Self {
            output_dir: PathBuf::from(&app.paths.output_directory),
            limit: None,
            concurrency: app.pools.max_download_concurrency,
            filter: None,
            reference_date,
            user_agent: app.http.user_agent.clone(),
            timeout_secs: app.http.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/harvester.toml")).unwrap();
        assert_eq!(config.pools.max_download_concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.http.timeout_secs, 2);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvester.toml");
        std::fs::write(
            &path,
            r#"
[paths]
output_directory = "/srv/images"
log_directory = "/srv/logs"

[pools]
max_download_concurrency = 4

[http]
user_agent = "test-agent"
timeout_secs = 5

[logging]
log_level = "debug"
log_to_file = false
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.pools.max_download_concurrency, 4);
        assert_eq!(config.paths.output_directory, "/srv/images");
        assert_eq!(config.http.user_agent, "test-agent");
        assert!(!config.logging.log_to_file);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvester.toml");
        std::fs::write(&path, "not [valid toml").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Toml(_))
        ));
    }
}
