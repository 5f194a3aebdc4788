// Configuration loading and parsing (stats.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use trialstats_core::Period;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub logging: LoggingConfig,
    /// Period tag applied when a command does not pass `--period`.
    pub default_period: String,
}

// ---------------------------------------------------------------------------
// stats.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct StatsFile {
    database: DatabaseSection,
    logging: LoggingConfig,
    #[serde(default)]
    stats: StatsSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub dir: String,
    #[serde(default = "default_filter")]
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StatsSection {
    default_period: String,
}

impl Default for StatsSection {
    fn default() -> Self {
        Self {
            default_period: Period::DEFAULT_TAG.to_string(),
        }
    }
}

fn default_filter() -> String {
    "trialstats=info,warn".to_string()
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Name of the config file under both `defaults/` and `config/`.
const STATS_FILE: &str = "stats.toml";

/// Load and validate configuration from `config/stats.toml` relative to
/// `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let stats_path = base_dir.join("config").join(STATS_FILE);
    let text = read_file(&stats_path)?;
    let file: StatsFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: stats_path.clone(),
        source: e,
    })?;

    let config = Config {
        db_path: file.database.path,
        logging: file.logging,
        default_period: file.stats.default_period,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/stats.toml` from `defaults/stats.toml` when it is missing.
///
/// Returns the path written, or `None` when the config already exists or no
/// default is available; `load_config_from` then reports the missing file.
pub fn ensure_stats_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(STATS_FILE);
    if target.exists() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(STATS_FILE);
    if !source.is_file() {
        return Ok(None);
    }

    let copy_error = |action: &str, path: &Path, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {action} {}: {e}", path.display()),
    };
    if let Some(config_dir) = target.parent() {
        std::fs::create_dir_all(config_dir).map_err(|e| copy_error("create", config_dir, e))?;
    }
    std::fs::copy(&source, &target).map_err(|e| copy_error("copy defaults to", &target, e))?;

    Ok(Some(target))
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_stats_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.logging.dir.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.dir".into(),
            message: "must not be empty".into(),
        });
    }

    if !Period::is_known_tag(&config.default_period) {
        return Err(ConfigError::ValidationError {
            field: "stats.default_period".into(),
            message: format!(
                "must be one of weekly, monthly, general; got `{}`",
                config.default_period
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
