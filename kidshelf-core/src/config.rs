//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/kidshelf/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/kidshelf/` (~/.config/kidshelf/)
//! - Data: `$XDG_DATA_HOME/kidshelf/` (~/.local/share/kidshelf/)
//! - State/Logs: `$XDG_STATE_HOME/kidshelf/` (~/.local/state/kidshelf/)
//!
//! API keys may be supplied in the config file or via the `TMDB_API_KEY` and
//! `GEMINI_API_KEY` environment variables.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Metadata provider (TMDB) configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// AI safety assessment configuration
    #[serde(default)]
    pub assessment: AssessmentConfig,

    /// Discovery filters and targets
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Path overrides for staging files and the catalog
    #[serde(default)]
    pub paths: PathOverrides,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata provider (TMDB) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// API key (can also use TMDB_API_KEY env var)
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Image CDN base URL
    #[serde(default = "default_image_base_url")]
    pub image_base: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// Minimum spacing between requests in milliseconds (40 req/10s limit)
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_provider_base_url(),
            image_base: default_image_base_url(),
            timeout_secs: default_provider_timeout(),
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key from config or environment.
    ///
    /// Returns an error when neither is set; the stage performs no work.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("TMDB_API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config("provider.api_key (or TMDB_API_KEY env var) is required".to_string())
            })
    }
}

fn default_provider_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_provider_timeout() -> u64 {
    10
}

fn default_min_interval_ms() -> u64 {
    250
}

/// AI safety assessment (Gemini) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AssessmentConfig {
    /// API key (can also use GEMINI_API_KEY env var)
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_assessment_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_assessment_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_assessment_timeout")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures (429/5xx)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Minimum delay between requests in seconds (client-side rate shaping)
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: f64,

    /// Exponential backoff base in seconds
    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: f64,

    /// Backoff ceiling in seconds (also caps Retry-After)
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: f64,

    /// Max new assessments per run (0 = unlimited)
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_assessment_model(),
            base_url: default_assessment_base_url(),
            timeout_secs: default_assessment_timeout(),
            max_retries: default_max_retries(),
            min_delay_secs: default_min_delay(),
            backoff_base_secs: default_backoff_base(),
            max_backoff_secs: default_max_backoff(),
            batch_limit: default_batch_limit(),
        }
    }
}

impl AssessmentConfig {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "assessment.api_key (or GEMINI_API_KEY env var) is required".to_string(),
                )
            })
    }
}

fn default_assessment_model() -> String {
    "gemini-2.5-flash-preview-09-2025".to_string()
}

fn default_assessment_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_assessment_timeout() -> u64 {
    15
}

fn default_max_retries() -> usize {
    5
}

fn default_min_delay() -> f64 {
    1.0
}

fn default_backoff_base() -> f64 {
    2.0
}

fn default_max_backoff() -> f64 {
    30.0
}

fn default_batch_limit() -> usize {
    500
}

/// Discovery filters and target counts
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// How many *new* TV shows to collect per run
    #[serde(default = "default_tv_target")]
    pub tv_target: usize,

    /// How many *new* movies to collect per run
    #[serde(default = "default_movie_target")]
    pub movie_target: usize,

    /// Hard cap on pages scanned per media kind
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Watch region for platform availability
    #[serde(default = "default_watch_region")]
    pub watch_region: String,

    /// Original language filter
    #[serde(default = "default_language")]
    pub language: String,

    /// Minimum vote count
    #[serde(default = "default_min_vote_count")]
    pub min_vote_count: u32,

    /// Minimum vote average
    #[serde(default = "default_min_vote_average")]
    pub min_vote_average: f64,

    /// Pipe-separated provider ids to restrict discovery (e.g. "8|337")
    pub watch_providers: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            tv_target: default_tv_target(),
            movie_target: default_movie_target(),
            max_pages: default_max_pages(),
            watch_region: default_watch_region(),
            language: default_language(),
            min_vote_count: default_min_vote_count(),
            min_vote_average: default_min_vote_average(),
            watch_providers: None,
        }
    }
}

fn default_tv_target() -> usize {
    100
}

fn default_movie_target() -> usize {
    30
}

fn default_max_pages() -> usize {
    50
}

fn default_watch_region() -> String {
    "US".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_min_vote_count() -> u32 {
    5
}

fn default_min_vote_average() -> f64 {
    5.0
}

/// Optional overrides for where files live
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PathOverrides {
    /// Directory for intermediate stage files
    pub staging_dir: Option<PathBuf>,
    /// Path to the catalog file
    pub catalog_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/kidshelf/config.toml` (~/.config/kidshelf/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("kidshelf").join("config.toml")
    }

    /// Returns the data directory path
    ///
    /// `$XDG_DATA_HOME/kidshelf/` (~/.local/share/kidshelf/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("kidshelf")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/kidshelf/` (~/.local/state/kidshelf/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("kidshelf")
    }

    /// Returns the staging directory for intermediate stage files
    pub fn staging_dir(&self) -> PathBuf {
        self.paths
            .staging_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("staging"))
    }

    /// Returns the catalog file path
    pub fn catalog_path(&self) -> PathBuf {
        self.paths
            .catalog_file
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("shows.json"))
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.provider.min_interval_ms, 250);
        assert_eq!(config.assessment.max_retries, 5);
        assert_eq!(config.assessment.max_backoff_secs, 30.0);
        assert_eq!(config.discovery.tv_target, 100);
        assert_eq!(config.discovery.movie_target, 30);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[provider]
api_key = "tmdb-key"

[assessment]
api_key = "gemini-key"
max_retries = 3
batch_limit = 50

[discovery]
tv_target = 10
watch_providers = "8|337"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("tmdb-key"));
        assert_eq!(config.assessment.max_retries, 3);
        assert_eq!(config.assessment.batch_limit, 50);
        assert_eq!(config.discovery.tv_target, 10);
        assert_eq!(config.discovery.watch_providers.as_deref(), Some("8|337"));
        assert_eq!(config.logging.level, "debug");
        // Unset fields keep their defaults
        assert_eq!(config.assessment.min_delay_secs, 1.0);
        assert_eq!(config.discovery.movie_target, 30);
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let config = ProviderConfig::default();
        std::env::remove_var("TMDB_API_KEY");
        assert!(config.resolve_api_key().is_err());
    }

    #[test]
    fn test_resolve_api_key_from_config() {
        let config = ProviderConfig {
            api_key: Some("  abc123  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "abc123");
    }
}
