//! Cache layer
//!
//! This module provides:
//! - A trait for cache backends
//! - An optional capability for deleting keys by glob pattern
//! - A database backend (rows in the target store) and an in-process one

mod database;
mod memory;

pub use database::*;
pub use memory::*;

use crate::config::{CacheBackendKind, Config};
use crate::error::Result;
use crate::store::TargetDb;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Snapshot of a cache's contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub keys: usize,
    pub expired_keys: usize,
    /// Sum of key and value lengths
    pub approx_size_bytes: u64,
    pub max_entries: usize,
}

impl CacheStats {
    /// Share of `max_entries` in use, as a percentage
    pub fn usage_percent(&self) -> Option<f64> {
        if self.max_entries == 0 {
            return None;
        }
        Some(self.keys as f64 / self.max_entries as f64 * 100.0)
    }
}

/// Trait for cache backends
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Backend kind, as written in the config
    fn kind(&self) -> CacheBackendKind;

    /// Fetch a live entry
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store an entry, `None` meaning it never expires
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Remove every entry, returning how many were removed
    async fn clear(&self) -> Result<usize>;

    async fn stats(&self) -> Result<CacheStats>;

    /// Pattern deletion, for backends that support it
    fn pattern_clear(&self) -> Option<&dyn SupportsPatternClear> {
        None
    }
}

/// Deleting keys by glob pattern (`*`, `?`, `[...]`)
#[async_trait]
pub trait SupportsPatternClear: Send + Sync {
    /// Number of keys the pattern would remove
    async fn count_matching(&self, pattern: &str) -> Result<usize>;

    /// Remove matching keys, returning how many were removed
    async fn clear_matching(&self, pattern: &str) -> Result<usize>;
}

/// Open the cache configured under `alias`
pub fn open_cache(config: &Config, alias: &str, db: &TargetDb) -> Result<Box<dyn CacheBackend>> {
    let cache = config.cache(alias)?;
    debug!(alias, backend = %cache.backend, "Opening cache");

    let backend: Box<dyn CacheBackend> = match cache.backend {
        CacheBackendKind::Database => Box::new(DatabaseCache::new(db.clone(), cache.max_entries)),
        CacheBackendKind::Memory => Box::new(MemoryCache::new(cache.max_entries)),
    };
    Ok(backend)
}

/// Human-readable byte size with two decimals
pub fn format_bytes(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}

/// Unix time a TTL runs out at, `None` when it lies beyond what an `i64` holds
pub(crate) fn expiry_timestamp(now: i64, ttl: Duration) -> Option<i64> {
    i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| now.checked_add(secs))
}

/// Entries removed when a full cache needs room
pub(crate) fn cull_count(max_entries: usize) -> usize {
    (max_entries / 3).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::test_support::{target_db, test_config};
    use tempfile::TempDir;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024u64.pow(4)), "3.00 TB");
    }

    #[test]
    fn test_expiry_timestamp_overflow_never_expires() {
        assert_eq!(expiry_timestamp(100, Duration::from_secs(60)), Some(160));
        assert_eq!(expiry_timestamp(100, Duration::from_secs(i64::MAX as u64)), None);
        assert_eq!(expiry_timestamp(100, Duration::from_secs(u64::MAX)), None);
    }

    #[test]
    fn test_usage_percent() {
        let stats = CacheStats {
            keys: 30,
            max_entries: 300,
            ..Default::default()
        };
        assert_eq!(stats.usage_percent(), Some(10.0));
        assert_eq!(CacheStats::default().usage_percent(), None);
    }

    #[tokio::test]
    async fn test_open_cache_by_alias() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.caches.insert(
            "sessions".to_string(),
            CacheConfig {
                backend: CacheBackendKind::Memory,
                max_entries: 5,
            },
        );
        let db = target_db(&config).await;

        let default = open_cache(&config, "default", &db).unwrap();
        assert_eq!(default.kind(), CacheBackendKind::Database);
        assert!(default.pattern_clear().is_some());

        let sessions = open_cache(&config, "sessions", &db).unwrap();
        assert_eq!(sessions.kind(), CacheBackendKind::Memory);
        assert!(sessions.pattern_clear().is_none());

        assert!(open_cache(&config, "missing", &db).is_err());
    }
}
