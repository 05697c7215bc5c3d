//! In-process cache, lives only as long as the command

use super::{cull_count, CacheBackend, CacheStats};
use crate::config::CacheBackendKind;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
    seq: u64,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// Map-backed cache without pattern deletion
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_entries,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn make_room(inner: &mut Inner, max_entries: usize, now: DateTime<Utc>) {
    inner.entries.retain(|_, entry| !entry.is_expired(now));
    if inner.entries.len() < max_entries {
        return;
    }

    let mut by_age: Vec<(u64, String)> = inner
        .entries
        .iter()
        .map(|(key, entry)| (entry.seq, key.clone()))
        .collect();
    by_age.sort();
    for (_, key) in by_age.into_iter().take(cull_count(max_entries)) {
        inner.entries.remove(&key);
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn kind(&self) -> CacheBackendKind {
        CacheBackendKind::Memory
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut inner = self.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired(Utc::now()),
            None => return Ok(None),
        };
        if expired {
            inner.entries.remove(key);
            return Ok(None);
        }
        Ok(inner.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut inner = self.lock();
        let now = Utc::now();
        if !inner.entries.contains_key(key) {
            make_room(&mut inner, self.max_entries, now);
        }

        // A TTL too large to represent never expires
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| now.checked_add_signed(ttl));
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
                seq,
            },
        );
        Ok(())
    }

    async fn clear(&self) -> Result<usize> {
        let mut inner = self.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        Ok(removed)
    }

    async fn stats(&self) -> Result<CacheStats> {
        let inner = self.lock();
        let now = Utc::now();
        Ok(CacheStats {
            keys: inner.entries.len(),
            expired_keys: inner.entries.values().filter(|e| e.is_expired(now)).count(),
            approx_size_bytes: inner
                .entries
                .iter()
                .map(|(key, entry)| (key.len() + entry.value.len()) as u64)
                .sum(),
            max_entries: self.max_entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_roundtrip_and_clear() {
        let cache = MemoryCache::new(10);
        cache.set("a", "1", None).await.unwrap();
        cache.set("b", "2", Some(Duration::from_secs(60))).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.get("b").await.unwrap(), Some("2".to_string()));

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert_eq!(cache.stats().await.unwrap().keys, 0);
    }

    #[tokio::test]
    async fn test_memory_has_no_pattern_clear() {
        let cache = MemoryCache::new(10);
        assert!(cache.pattern_clear().is_none());
    }

    #[tokio::test]
    async fn test_memory_huge_ttl_never_expires() {
        let cache = MemoryCache::new(10);
        cache
            .set("k", "v", Some(Duration::from_secs(u64::MAX / 2)))
            .await
            .unwrap();
        cache.set("m", "w", Some(Duration::MAX)).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.get("m").await.unwrap(), Some("w".to_string()));
        assert_eq!(cache.stats().await.unwrap().expired_keys, 0);
    }

    #[tokio::test]
    async fn test_memory_expiry_and_cull() {
        let cache = MemoryCache::new(2);
        cache.set("old", "v", Some(Duration::ZERO)).await.unwrap();
        assert_eq!(cache.stats().await.unwrap().expired_keys, 1);
        assert_eq!(cache.get("old").await.unwrap(), None);

        cache.set("a", "v", None).await.unwrap();
        cache.set("b", "v", None).await.unwrap();
        cache.set("c", "v", None).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.stats().await.unwrap().keys, 2);
    }
}
