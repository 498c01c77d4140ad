//! Application configuration for Newsroom.
//!
//! User config lives at `~/.newsroom/newsroom.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NewsroomError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newsroom.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newsroom";

// ---------------------------------------------------------------------------
// Config structs (matching newsroom.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Content store and media library locations.
    #[serde(default)]
    pub store: StoreConfig,

    /// Document selection for batch runs.
    #[serde(default)]
    pub batch: BatchSection,

    /// Empirical content-shape constants.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Remote asset download settings.
    #[serde(default)]
    pub assets: AssetSection,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the libSQL database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory where downloaded image bytes are kept.
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            media_dir: default_media_dir(),
        }
    }
}

fn default_database_path() -> String {
    "var/newsroom.db".into()
}
fn default_media_dir() -> String {
    "var/media".into()
}

/// `[batch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSection {
    /// Category slugs never touched by batch runs.
    #[serde(default = "default_excluded_categories")]
    pub excluded_categories: Vec<String>,

    /// Only select published articles.
    #[serde(default = "default_true")]
    pub live_only: bool,

    /// Run operations and report, but never persist.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            excluded_categories: default_excluded_categories(),
            live_only: true,
            dry_run: false,
        }
    }
}

fn default_excluded_categories() -> Vec<String> {
    vec!["podcasts".into()]
}
fn default_true() -> bool {
    true
}

/// `[thresholds]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Articles whose rich text is shorter than this need expansion.
    #[serde(default = "default_short_article_chars")]
    pub short_article_chars: usize,

    /// Number of text sections produced when restructuring.
    #[serde(default = "default_split_sections")]
    pub split_sections: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            short_article_chars: default_short_article_chars(),
            split_sections: default_split_sections(),
        }
    }
}

fn default_short_article_chars() -> usize {
    3000
}
fn default_split_sections() -> usize {
    3
}

/// `[assets]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSection {
    /// Per-request timeout for downloads.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with downloads.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Downloads larger than this are rejected.
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,
}

impl Default for AssetSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_download_bytes: default_max_download_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("Newsroom/", env!("CARGO_PKG_VERSION")).into()
}
fn default_max_download_bytes() -> u64 {
    20 * 1024 * 1024
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime batch configuration passed to the batch runner.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Category slugs to skip.
    pub excluded_categories: Vec<String>,
    /// Only select published articles.
    pub live_only: bool,
    /// Skip persisting mutated documents.
    pub dry_run: bool,
    /// Restrict the run to these slugs (empty means all).
    pub only_slugs: Vec<String>,
}

impl From<&AppConfig> for BatchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            excluded_categories: config.batch.excluded_categories.clone(),
            live_only: config.batch.live_only,
            dry_run: config.batch.dry_run,
            only_slugs: Vec::new(),
        }
    }
}

/// Runtime asset download configuration.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Maximum accepted body size in bytes.
    pub max_download_bytes: u64,
    /// Where stored bytes go.
    pub media_dir: PathBuf,
}

impl From<&AppConfig> for AssetConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.assets.timeout_secs),
            user_agent: config.assets.user_agent.clone(),
            max_download_bytes: config.assets.max_download_bytes,
            media_dir: PathBuf::from(&config.store.media_dir),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newsroom/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsroomError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newsroom/newsroom.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewsroomError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NewsroomError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NewsroomError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsroomError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewsroomError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values the operations cannot work with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.thresholds.split_sections == 0 {
        return Err(NewsroomError::config(
            "thresholds.split_sections must be at least 1",
        ));
    }
    if config.assets.timeout_secs == 0 {
        return Err(NewsroomError::config("assets.timeout_secs must be positive"));
    }
    Ok(())
}
