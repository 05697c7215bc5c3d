//! Configuration management for mtb-tools
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! Every path and default the commands rely on lives here instead of being
//! hardcoded in the commands themselves.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database holding pages, media, history and the database cache
    #[serde(default = "default_target_db")]
    pub target_db: PathBuf,

    /// History import configuration
    #[serde(default)]
    pub import: ImportConfig,

    /// Media folder scan configuration
    #[serde(default)]
    pub media: MediaConfig,

    /// Phase view configuration
    #[serde(default)]
    pub view: ViewConfig,

    /// Cache aliases
    #[serde(default = "default_caches")]
    pub caches: BTreeMap<String, CacheConfig>,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// History import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Legacy database read by `import-history`
    #[serde(default = "default_legacy_db")]
    pub legacy_db: PathBuf,

    /// Case-insensitive substring locating the history table
    #[serde(default = "default_table_hint")]
    pub table_hint: String,

    /// Phase for rows without one and for placeholder pages
    #[serde(default = "default_phase")]
    pub default_phase: Phase,

    /// Placeholder page name template, must contain `{id}`
    #[serde(default = "default_placeholder_name")]
    pub placeholder_name: String,

    /// Run the content normalizer on imported history
    #[serde(default = "default_normalize_content")]
    pub normalize_content: bool,
}

/// Media folder scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Folder containing one sub-directory per phase
    #[serde(default = "default_media_root")]
    pub root: PathBuf,

    /// Phase directories to scan, in order
    #[serde(default = "default_media_phases")]
    pub phases: Vec<Phase>,

    /// Page that owns every populated media item
    #[serde(default = "default_owner_page_id")]
    pub owner_page_id: i64,

    /// Name given to the owner page if it has to be created
    #[serde(default = "default_owner_page_name")]
    pub owner_page_name: String,
}

/// Phase view configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Cache alias used to store rendered views
    #[serde(default = "default_view_cache_alias")]
    pub cache_alias: String,

    /// Lifetime of a cached view in seconds (0 disables caching)
    #[serde(default = "default_view_cache_ttl")]
    pub cache_ttl_secs: u64,
}

/// Cache backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// Rows in the target database, shared across invocations
    Database,
    /// In-process map, lives only as long as the command
    Memory,
}

impl fmt::Display for CacheBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackendKind::Database => write!(f, "database"),
            CacheBackendKind::Memory => write!(f, "memory"),
        }
    }
}

/// A single cache alias
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackendKind,

    /// Maximum number of entries kept
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Directory relative paths are resolved against
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_db: default_target_db(),
            import: ImportConfig::default(),
            media: MediaConfig::default(),
            view: ViewConfig::default(),
            caches: default_caches(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            legacy_db: default_legacy_db(),
            table_hint: default_table_hint(),
            default_phase: default_phase(),
            placeholder_name: default_placeholder_name(),
            normalize_content: default_normalize_content(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            phases: default_media_phases(),
            owner_page_id: default_owner_page_id(),
            owner_page_name: default_owner_page_name(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            cache_alias: default_view_cache_alias(),
            cache_ttl_secs: default_view_cache_ttl(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl Config {
    /// Get the default config file path (`./mtb.toml`)
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// Initialize paths configuration
    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(|| PathBuf::from("."));
        self.paths = PathsConfig {
            config_file: base.join(CONFIG_FILE_NAME),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    /// when no config file is present
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Resolve a configured path against the config file's directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || self.paths.base_dir.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.paths.base_dir.join(path)
        }
    }

    /// Target database path
    pub fn target_db_path(&self) -> PathBuf {
        self.resolve_path(&self.target_db)
    }

    /// Legacy database path read by `import-history`
    pub fn legacy_db_path(&self) -> PathBuf {
        self.resolve_path(&self.import.legacy_db)
    }

    /// Media root folder
    pub fn media_root(&self) -> PathBuf {
        self.resolve_path(&self.media.root)
    }

    /// Look up a cache alias
    pub fn cache(&self, alias: &str) -> Result<&CacheConfig> {
        self.caches.get(alias).ok_or_else(|| Error::UnknownCacheAlias {
            alias: alias.to_string(),
            available: self.caches.keys().cloned().collect(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.import.placeholder_name.contains("{id}") {
            return Err(Error::Config(
                "import.placeholder_name must contain '{id}'".to_string(),
            ));
        }

        if self.import.table_hint.trim().is_empty() {
            return Err(Error::Config(
                "import.table_hint must not be empty".to_string(),
            ));
        }

        if self.media.phases.is_empty() {
            return Err(Error::Config(
                "media.phases must list at least one phase".to_string(),
            ));
        }

        if self.caches.is_empty() {
            return Err(Error::Config(
                "at least one cache alias must be configured".to_string(),
            ));
        }

        for (alias, cache) in &self.caches {
            if cache.max_entries == 0 {
                return Err(Error::Config(format!(
                    "caches.{}.max_entries must be positive",
                    alias
                )));
            }
        }

        if !self.caches.contains_key(&self.view.cache_alias) {
            return Err(Error::Config(format!(
                "view.cache_alias '{}' is not a configured cache",
                self.view.cache_alias
            )));
        }

        Ok(())
    }
}
