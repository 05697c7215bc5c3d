//! Target store using SQLite
//!
//! This module handles the application's own tables:
//! - Pages (archive pages, ids stable across migrations)
//! - Media (images/videos per phase)
//! - History (free-text entries per page and phase)
//!
//! It also owns the `cache_entries` table used by the database cache.

mod schema;

pub use schema::*;

use crate::error::Result;
use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Media kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Classify a file extension; only `jpg` and `mp4` are recognized
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" => Some(MediaType::Image),
            "mp4" => Some(MediaType::Video),
            _ => None,
        }
    }

    /// Classify a file by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Video => write!(f, "video"),
        }
    }
}

/// An archive page
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub name: String,
    pub phase: String,
}

impl Page {
    pub fn new(id: i64, name: String, phase: Phase) -> Self {
        Self {
            id,
            name,
            phase: phase.to_string(),
        }
    }
}

/// A media item as stored
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub title: String,
    pub phase: String,
    pub path: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub media_type: String,
    pub page_id: i64,
}

/// A media item about to be inserted
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub title: String,
    pub phase: Phase,
    pub path: String,
    pub media_type: MediaType,
    pub page_id: i64,
}

/// A history entry as stored
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct History {
    pub id: i64,
    pub content: String,
    pub phase: String,
    pub page_id: i64,
}

/// A history entry about to be inserted
#[derive(Debug, Clone)]
pub struct NewHistory {
    pub content: String,
    pub phase: Phase,
    pub page_id: i64,
}

/// Target database handle
#[derive(Clone)]
pub struct TargetDb {
    pool: SqlitePool,
}

impl TargetDb {
    /// Open (creating if needed) the target database and its schema
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        debug!("Connecting to SQLite database at {:?}", db_path);

        // One connection: writes are strictly sequential
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };

        if !db.is_initialized().await? {
            db.init_schema().await?;
        }

        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='cache_entries'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(result.is_some())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    // ===== Page Operations =====

    /// Check whether a page id exists
    pub async fn page_exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM page WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Get page by ID
    pub async fn get_page(&self, id: i64) -> Result<Option<Page>> {
        let page = sqlx::query_as::<_, Page>("SELECT * FROM page WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(page)
    }

    /// Insert a page with an explicit id
    pub async fn insert_page(&self, page: &Page) -> Result<()> {
        sqlx::query("INSERT INTO page (id, name, phase) VALUES (?, ?, ?)")
            .bind(page.id)
            .bind(&page.name)
            .bind(&page.phase)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List all pages
    pub async fn list_pages(&self) -> Result<Vec<Page>> {
        let pages = sqlx::query_as::<_, Page>("SELECT * FROM page ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(pages)
    }

    // ===== History Operations =====

    /// Insert a history entry, returning its new id
    pub async fn insert_history(&self, entry: &NewHistory) -> Result<i64> {
        let result = sqlx::query("INSERT INTO history (content, phase, page_id) VALUES (?, ?, ?)")
            .bind(&entry.content)
            .bind(entry.phase.to_string())
            .bind(entry.page_id)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// History entries of a phase
    pub async fn list_history(&self, phase: Phase) -> Result<Vec<History>> {
        let entries = sqlx::query_as::<_, History>(
            "SELECT * FROM history WHERE phase = ? ORDER BY id",
        )
        .bind(phase.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    // ===== Media Operations =====

    /// Insert a media item, returning its new id
    pub async fn insert_media(&self, media: &NewMedia) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO media (title, phase, path, type, page_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&media.title)
        .bind(media.phase.to_string())
        .bind(&media.path)
        .bind(media.media_type.to_string())
        .bind(media.page_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Media items of a phase
    pub async fn list_media(&self, phase: Phase) -> Result<Vec<Media>> {
        let media = sqlx::query_as::<_, Media>("SELECT * FROM media WHERE phase = ? ORDER BY id")
            .bind(phase.to_string())
            .fetch_all(&self.pool)
            .await?;
        Ok(media)
    }

    // ===== Statistics =====

    /// Row counts of the application tables
    pub async fn get_global_stats(&self) -> Result<GlobalStats> {
        let page_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM page")
            .fetch_one(&self.pool)
            .await?;

        let media_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(&self.pool)
            .await?;

        let history_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history")
            .fetch_one(&self.pool)
            .await?;

        Ok(GlobalStats {
            page_count: page_count as usize,
            media_count: media_count as usize,
            history_count: history_count as usize,
        })
    }
}

/// Global statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub page_count: usize,
    pub media_count: usize,
    pub history_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_db() -> (TargetDb, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = TargetDb::open(&tmp.path().join("test.db")).await.unwrap();
        (db, tmp)
    }

    #[test]
    fn test_media_type_classification() {
        assert_eq!(MediaType::from_path(Path::new("photo.JPG")), Some(MediaType::Image));
        assert_eq!(MediaType::from_path(Path::new("clip.mp4")), Some(MediaType::Video));
        assert_eq!(MediaType::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaType::from_path(Path::new("photo.jpeg")), None);
        assert_eq!(MediaType::from_path(Path::new("README")), None);
    }

    #[tokio::test]
    async fn test_page_crud() {
        let (db, _tmp) = setup_test_db().await;

        assert!(!db.page_exists(3).await.unwrap());
        db.insert_page(&Page::new(3, "Intro".to_string(), Phase::DEFAULT))
            .await
            .unwrap();
        assert!(db.page_exists(3).await.unwrap());

        let loaded = db.get_page(3).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Intro");
        assert_eq!(loaded.phase, "01");

        // Ids are primary keys
        assert!(db
            .insert_page(&Page::new(3, "Dup".to_string(), Phase::DEFAULT))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_history_requires_existing_page() {
        let (db, _tmp) = setup_test_db().await;
        let entry = NewHistory {
            content: "text".to_string(),
            phase: Phase::new(2).unwrap(),
            page_id: 9,
        };

        assert!(db.insert_history(&entry).await.is_err());

        db.insert_page(&Page::new(9, "p".to_string(), Phase::DEFAULT))
            .await
            .unwrap();
        let id = db.insert_history(&entry).await.unwrap();
        assert!(id > 0);

        let listed = db.list_history(Phase::new(2).unwrap()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].phase, "02");
    }

    #[tokio::test]
    async fn test_media_insert_and_stats() {
        let (db, _tmp) = setup_test_db().await;
        db.insert_page(&Page::new(0, "home".to_string(), Phase::DEFAULT))
            .await
            .unwrap();

        let media = NewMedia {
            title: "photo".to_string(),
            phase: Phase::new(3).unwrap(),
            path: "photo".to_string(),
            media_type: MediaType::Image,
            page_id: 0,
        };
        db.insert_media(&media).await.unwrap();

        let listed = db.list_media(Phase::new(3).unwrap()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].media_type, "image");

        let stats = db.get_global_stats().await.unwrap();
        assert_eq!(
            stats,
            GlobalStats {
                page_count: 1,
                media_count: 1,
                history_count: 0
            }
        );
    }
}
