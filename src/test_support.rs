//! Fixtures shared by the unit tests

use crate::config::Config;
use crate::store::TargetDb;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::{Path, PathBuf};

/// Legacy history table as it appears in old archives
pub const OLD_HISTORY_SCHEMA: &str =
    "CREATE TABLE old_history (id INTEGER PRIMARY KEY, page_id INTEGER, content TEXT, phase TEXT)";

/// Create `legacy.sqlite3` under `dir` and run each statement in order
pub async fn create_legacy_db(dir: &Path, statements: &[&str]) -> PathBuf {
    create_db_at(&dir.join("legacy.sqlite3"), statements).await
}

/// Create a database file at `path` and run each statement in order
pub async fn create_db_at(path: &Path, statements: &[&str]) -> PathBuf {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;
    path.to_path_buf()
}

/// Config rooted in `dir` with default settings
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.paths.base_dir = dir.to_path_buf();
    config.paths.config_file = dir.join("mtb.toml");
    config
}

/// Fresh target store inside `dir`
pub async fn target_db(config: &Config) -> TargetDb {
    TargetDb::open(&config.target_db_path()).await.unwrap()
}
