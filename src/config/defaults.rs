//! Default values for configuration

use super::{CacheBackendKind, CacheConfig};
use crate::phase::{Phase, PHASES};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "mtb.toml";

/// Name of the cache alias used when none is given
pub const DEFAULT_CACHE_ALIAS: &str = "default";

/// Default target database (the application's own store)
pub fn default_target_db() -> PathBuf {
    PathBuf::from("db.sqlite3")
}

/// Default legacy database read by `import-history`
pub fn default_legacy_db() -> PathBuf {
    PathBuf::from("db.sqlite3.new")
}

/// Substring used to locate the history table in a legacy database
pub fn default_table_hint() -> String {
    "history".to_string()
}

/// Phase given to rows and placeholder pages that carry none
pub fn default_phase() -> Phase {
    Phase::DEFAULT
}

/// Name template for synthesized pages; `{id}` is replaced by the page id
pub fn default_placeholder_name() -> String {
    "Placeholder Page {id}".to_string()
}

/// Default: keep imported content as-is
pub fn default_normalize_content() -> bool {
    false
}

/// Default media folder, relative to the working directory
pub fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

/// Default: scan every known phase directory
pub fn default_media_phases() -> Vec<Phase> {
    PHASES.iter().map(|(phase, _)| *phase).collect()
}

/// Default page owning populated media
pub fn default_owner_page_id() -> i64 {
    0
}

/// Default name of the media owner page
pub fn default_owner_page_name() -> String {
    "home".to_string()
}

/// Default cache alias for rendered phase views
pub fn default_view_cache_alias() -> String {
    DEFAULT_CACHE_ALIAS.to_string()
}

/// Default lifetime of a cached phase view (10 minutes)
pub fn default_view_cache_ttl() -> u64 {
    600
}

/// Default cache backend kind
pub fn default_cache_backend() -> CacheBackendKind {
    CacheBackendKind::Database
}

/// Default maximum entries per cache
pub fn default_cache_max_entries() -> usize {
    300
}

/// Default cache aliases: a single database-backed `default` cache
pub fn default_caches() -> BTreeMap<String, CacheConfig> {
    let mut caches = BTreeMap::new();
    caches.insert(DEFAULT_CACHE_ALIAS.to_string(), CacheConfig::default());
    caches
}
