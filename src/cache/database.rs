//! Cache entries stored as rows of the target database

use super::{cull_count, expiry_timestamp, CacheBackend, CacheStats, SupportsPatternClear};
use crate::config::CacheBackendKind;
use crate::error::Result;
use crate::store::TargetDb;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::debug;

/// Cache backed by the `cache_entries` table, shared across invocations
pub struct DatabaseCache {
    db: TargetDb,
    max_entries: usize,
}

impl DatabaseCache {
    pub fn new(db: TargetDb, max_entries: usize) -> Self {
        Self { db, max_entries }
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    async fn make_room(&self) -> Result<()> {
        let pool = self.db.pool();
        sqlx::query("DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(Self::now())
            .execute(pool)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(pool)
            .await?;
        if (count as usize) < self.max_entries {
            return Ok(());
        }

        let cull = cull_count(self.max_entries) as i64;
        debug!(cull, "Culling oldest cache entries");
        sqlx::query(
            r#"
            DELETE FROM cache_entries WHERE rowid IN (
                SELECT rowid FROM cache_entries ORDER BY rowid LIMIT ?
            )
            "#,
        )
        .bind(cull)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for DatabaseCache {
    fn kind(&self) -> CacheBackendKind {
        CacheBackendKind::Database
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String, Option<i64>)> =
            sqlx::query_as("SELECT value, expires_at FROM cache_entries WHERE key = ?")
                .bind(key)
                .fetch_optional(self.db.pool())
                .await?;

        match row {
            Some((_, Some(expires_at))) if expires_at <= Self::now() => {
                sqlx::query("DELETE FROM cache_entries WHERE key = ?")
                    .bind(key)
                    .execute(self.db.pool())
                    .await?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let exists: Option<String> =
            sqlx::query_scalar("SELECT key FROM cache_entries WHERE key = ?")
                .bind(key)
                .fetch_optional(self.db.pool())
                .await?;
        if exists.is_none() {
            self.make_room().await?;
        }

        // A TTL too large to represent never expires
        let expires_at = ttl.and_then(|ttl| expiry_timestamp(Self::now(), ttl));
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<usize> {
        let result = sqlx::query("DELETE FROM cache_entries")
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn stats(&self) -> Result<CacheStats> {
        let (keys, expired, size): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN expires_at IS NOT NULL AND expires_at <= ? THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(LENGTH(key) + LENGTH(value)), 0)
            FROM cache_entries
            "#,
        )
        .bind(Self::now())
        .fetch_one(self.db.pool())
        .await?;

        Ok(CacheStats {
            keys: keys as usize,
            expired_keys: expired as usize,
            approx_size_bytes: size as u64,
            max_entries: self.max_entries,
        })
    }

    fn pattern_clear(&self) -> Option<&dyn SupportsPatternClear> {
        Some(self)
    }
}

#[async_trait]
impl SupportsPatternClear for DatabaseCache {
    async fn count_matching(&self, pattern: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries WHERE key GLOB ?")
            .bind(pattern)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count as usize)
    }

    async fn clear_matching(&self, pattern: &str) -> Result<usize> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key GLOB ?")
            .bind(pattern)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_cache(max_entries: usize) -> (DatabaseCache, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = TargetDb::open(&tmp.path().join("cache.db")).await.unwrap();
        (DatabaseCache::new(db, max_entries), tmp)
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let (cache, _tmp) = setup_cache(10).await;
        assert_eq!(cache.get("a").await.unwrap(), None);

        cache.set("a", "1", None).await.unwrap();
        cache.set("a", "2", None).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some("2".to_string()));
        assert_eq!(cache.stats().await.unwrap().keys, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let (cache, _tmp) = setup_cache(10).await;
        cache.set("gone", "x", Some(Duration::ZERO)).await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.expired_keys, 1);

        assert_eq!(cache.get("gone").await.unwrap(), None);
        assert_eq!(cache.stats().await.unwrap().keys, 0);
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let (cache, _tmp) = setup_cache(10).await;
        cache
            .set("far", "x", Some(Duration::from_secs(i64::MAX as u64)))
            .await
            .unwrap();
        cache
            .set("farther", "y", Some(Duration::from_secs(u64::MAX)))
            .await
            .unwrap();

        assert_eq!(cache.get("far").await.unwrap(), Some("x".to_string()));
        assert_eq!(cache.get("farther").await.unwrap(), Some("y".to_string()));
        assert_eq!(cache.stats().await.unwrap().expired_keys, 0);
    }

    #[tokio::test]
    async fn test_pattern_clear() {
        let (cache, _tmp) = setup_cache(10).await;
        for key in ["user:1", "user:2", "view:phase:01"] {
            cache.set(key, "v", None).await.unwrap();
        }

        let patterns = cache.pattern_clear().unwrap();
        assert_eq!(patterns.count_matching("user:*").await.unwrap(), 2);
        assert_eq!(patterns.clear_matching("user:*").await.unwrap(), 2);
        assert_eq!(cache.get("view:phase:01").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.clear().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_full_cache_culls_oldest() {
        let (cache, _tmp) = setup_cache(3).await;
        for key in ["a", "b", "c", "d"] {
            cache.set(key, "v", None).await.unwrap();
        }

        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.get("d").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.stats().await.unwrap().keys, 3);
    }

    #[tokio::test]
    async fn test_stats_size() {
        let (cache, _tmp) = setup_cache(10).await;
        cache.set("key", "value", None).await.unwrap();
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.approx_size_bytes, 8);
        assert_eq!(stats.max_entries, 10);
    }
}
