//! Read-only access to legacy SQLite databases
//!
//! Nothing about the source schema is known at compile time: tables and
//! columns are discovered at runtime and every row comes back as a
//! [`LegacyRow`].

mod row;

pub use row::*;

use crate::error::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::path::Path;
use tracing::debug;

/// Prefix of SQLite's internal tables
pub const SYSTEM_TABLE_PREFIX: &str = "sqlite_";

/// Quote an identifier for interpolation into SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Find the first table whose name contains `needle`, ignoring case
pub fn find_table<'a>(tables: &'a [String], needle: &str) -> Option<&'a str> {
    let needle = needle.to_lowercase();
    tables
        .iter()
        .find(|t| t.to_lowercase().contains(&needle))
        .map(String::as_str)
}

/// Handle on a legacy database file
pub struct LegacyDb {
    pool: SqlitePool,
}

impl LegacyDb {
    /// Open a legacy database read-only
    ///
    /// The file must already exist; a missing file is reported before any
    /// connection is attempted.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::DatabaseNotFound(path.to_path_buf()));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        debug!("Opening legacy database at {:?}", path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// User tables in creation order, internal tables excluded
    pub async fn tables(&self) -> Result<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&self.pool)
                .await?;

        Ok(names
            .into_iter()
            .filter(|name| !name.starts_with(SYSTEM_TABLE_PREFIX))
            .collect())
    }

    /// Column names of a table in declaration order
    pub async fn columns(&self, table: &str) -> Result<Vec<String>> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            columns.push(row.try_get::<String, _>("name")?);
        }
        Ok(columns)
    }

    /// Locate a table by case-insensitive substring
    pub async fn locate_table(&self, needle: &str) -> Result<String> {
        let tables = self.tables().await?;
        match find_table(&tables, needle) {
            Some(table) => Ok(table.to_string()),
            None => Err(Error::TableNotFound {
                pattern: needle.to_string(),
                tables,
            }),
        }
    }

    /// Full scan of a table
    ///
    /// The whole result set is held in memory; legacy archives are small.
    pub async fn rows(&self, table: &str) -> Result<Vec<LegacyRow>> {
        let sql = format!("SELECT * FROM {}", quote_ident(table));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        debug!(table, count = rows.len(), "Fetched legacy rows");

        rows.iter().map(decode_row).collect()
    }

    /// Number of rows in a table
    pub async fn count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Row counts grouped by the text value of `column`, ordered by value
    pub async fn group_counts(&self, table: &str, column: &str) -> Result<Vec<(Option<String>, i64)>> {
        let column = quote_ident(column);
        let sql = format!(
            "SELECT CAST({col} AS TEXT), COUNT(*) FROM {table} GROUP BY 1 ORDER BY 1",
            col = column,
            table = quote_ident(table)
        );
        let groups: Vec<(Option<String>, i64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(groups)
    }

    /// Release the connection
    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn decode_row(row: &SqliteRow) -> Result<LegacyRow> {
    let mut out = LegacyRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        out.push(column.name(), decode_value(row, index)?);
    }
    Ok(out)
}

fn decode_value(row: &SqliteRow, index: usize) -> Result<LegacyValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(LegacyValue::Null);
    }
    let storage = raw.type_info().name().to_string();

    let value = match storage.as_str() {
        "INTEGER" => LegacyValue::Integer(row.try_get::<i64, _>(index)?),
        "REAL" => LegacyValue::Real(row.try_get::<f64, _>(index)?),
        "BLOB" => LegacyValue::Blob(row.try_get::<Vec<u8>, _>(index)?),
        _ => LegacyValue::Text(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_legacy_db, OLD_HISTORY_SCHEMA};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.sqlite3");

        let err = LegacyDb::open(&path).await.err().unwrap();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nope.sqlite3"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_tables_exclude_internal() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(
            tmp.path(),
            &[
                "CREATE TABLE page (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)",
                OLD_HISTORY_SCHEMA,
                "INSERT INTO page (name) VALUES ('a')",
            ],
        )
        .await;

        let db = LegacyDb::open(&path).await.unwrap();
        let tables = db.tables().await.unwrap();
        // AUTOINCREMENT creates sqlite_sequence behind the scenes
        assert_eq!(tables, vec!["page".to_string(), "old_history".to_string()]);
        db.close().await;
    }

    #[tokio::test]
    async fn test_columns_match_row_keys() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(
            tmp.path(),
            &[
                OLD_HISTORY_SCHEMA,
                "INSERT INTO old_history VALUES (1, 5, 'a', '02')",
                "INSERT INTO old_history VALUES (2, 6, NULL, NULL)",
                "CREATE TABLE misc (a REAL, b BLOB, c TEXT)",
                "INSERT INTO misc VALUES (1.5, x'6869', 'x')",
            ],
        )
        .await;

        let db = LegacyDb::open(&path).await.unwrap();
        for table in db.tables().await.unwrap() {
            let columns = db.columns(&table).await.unwrap();
            let rows = db.rows(&table).await.unwrap();
            assert!(!rows.is_empty());
            for row in &rows {
                assert_eq!(row.len(), columns.len());
                assert_eq!(row.field_names().collect::<Vec<_>>(), columns);
            }
        }

        let misc = db.rows("misc").await.unwrap();
        assert_eq!(misc[0].get("a"), Some(&LegacyValue::Real(1.5)));
        assert_eq!(misc[0].get("b"), Some(&LegacyValue::Blob(b"hi".to_vec())));

        let history = db.rows("old_history").await.unwrap();
        assert_eq!(history[1].get("content"), Some(&LegacyValue::Null));
        db.close().await;
    }

    #[tokio::test]
    async fn test_rows_are_reinvocable() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(
            tmp.path(),
            &[
                OLD_HISTORY_SCHEMA,
                "INSERT INTO old_history VALUES (1, 5, 'a', '02')",
            ],
        )
        .await;

        let db = LegacyDb::open(&path).await.unwrap();
        let first = db.rows("old_history").await.unwrap();
        let second = db.rows("old_history").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(db.count("old_history").await.unwrap(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_group_counts() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(
            tmp.path(),
            &[
                "CREATE TABLE page (id INTEGER PRIMARY KEY, name TEXT, phase)",
                "INSERT INTO page VALUES (1, 'a', '02'), (2, 'b', '02'), (3, 'c', 0), (4, 'd', NULL)",
            ],
        )
        .await;

        let db = LegacyDb::open(&path).await.unwrap();
        let groups = db.group_counts("page", "phase").await.unwrap();
        assert_eq!(
            groups,
            vec![
                (None, 1),
                (Some("0".to_string()), 1),
                (Some("02".to_string()), 2),
            ]
        );
        db.close().await;
    }

    #[tokio::test]
    async fn test_locate_table() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(
            tmp.path(),
            &["CREATE TABLE app_page (id INTEGER)", OLD_HISTORY_SCHEMA],
        )
        .await;

        let db = LegacyDb::open(&path).await.unwrap();
        assert_eq!(db.locate_table("HISTORY").await.unwrap(), "old_history");
        let err = db.locate_table("media").await.unwrap_err();
        assert!(matches!(err, Error::TableNotFound { .. }));
        db.close().await;
    }

    #[test]
    fn test_find_table_first_match_wins() {
        let tables = vec![
            "app_history".to_string(),
            "History_backup".to_string(),
        ];
        assert_eq!(find_table(&tables, "history"), Some("app_history"));
        assert_eq!(find_table(&tables, "media"), None);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("old history"), "\"old history\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
