//! History extraction: cleaned history rows to JSON plus a text preview

use crate::error::Result;
use crate::legacy::{LegacyDb, LegacyRow};
use crate::normalize::normalize_row;
use crate::sink::{preview_path, write_json, write_preview};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Statistics from a history extraction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractStats {
    pub db_file: String,
    pub table: String,
    pub columns: Vec<String>,
    pub records: usize,
    pub normalized: usize,
    /// Unset when the table was empty and nothing was written
    pub output_file: Option<String>,
    pub preview_file: Option<String>,
}

/// Extract the first table matching `table_hint`, cleaning `content`
pub async fn cmd_extract_history(
    db_file: &Path,
    output: &Path,
    table_hint: &str,
) -> Result<ExtractStats> {
    let db = LegacyDb::open(db_file).await?;
    info!("Connecting to database: {}", db_file.display());

    let result = read_history(&db, table_hint).await;
    db.close().await;
    let (table, columns, mut rows) = result?;

    let mut stats = ExtractStats {
        db_file: db_file.display().to_string(),
        table,
        columns,
        records: rows.len(),
        ..Default::default()
    };

    if rows.is_empty() {
        warn!("No history records found in table {}", stats.table);
        return Ok(stats);
    }
    info!("Found {} history records", rows.len());

    for row in rows.iter_mut() {
        if normalize_row(row) {
            stats.normalized += 1;
        }
    }

    write_json(output, &rows)?;
    let preview = preview_path(output);
    write_preview(&preview, &rows)?;

    stats.output_file = Some(output.display().to_string());
    stats.preview_file = Some(preview.display().to_string());
    Ok(stats)
}

async fn read_history(
    db: &LegacyDb,
    table_hint: &str,
) -> Result<(String, Vec<String>, Vec<LegacyRow>)> {
    let tables = db.tables().await?;
    info!("Tables in database: {}", tables.join(", "));

    let table = db.locate_table(table_hint).await?;
    info!("Found history table: {}", table);

    let columns = db.columns(&table).await?;
    info!("Columns in history table: {}", columns.join(", "));

    let rows = db.rows(&table).await?;
    Ok((table, columns, rows))
}

/// Print extraction results
pub fn print_extract_stats(stats: &ExtractStats) {
    match (&stats.output_file, &stats.preview_file) {
        (Some(output), Some(preview)) => {
            println!("\n✓ Cleaned history data saved to: {}", output);
            println!(
                "✓ Full preview of ALL {} records saved to: {}",
                stats.records, preview
            );
        }
        _ => println!("\n⚠ No history records found in table {}", stats.table),
    }
    println!("\n  Table: {}", stats.table);
    println!("  Columns: {}", stats.columns.join(", "));
    println!("  Records: {}", stats.records);
    println!("  Content cleaned: {}", stats.normalized);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_legacy_db, OLD_HISTORY_SCHEMA};
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_extract_old_history() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(
            tmp.path(),
            &[
                "CREATE TABLE page (id INTEGER PRIMARY KEY)",
                OLD_HISTORY_SCHEMA,
                r"INSERT INTO old_history VALUES (1, 5, 'line1\r\nline2', '02')",
            ],
        )
        .await;
        let output = tmp.path().join("history.json");

        let stats = cmd_extract_history(&path, &output, "history").await.unwrap();
        assert_eq!(stats.table, "old_history");
        assert_eq!(stats.records, 1);
        assert_eq!(stats.normalized, 1);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            written,
            json!([{"id": 1, "page_id": 5, "content": "line1 line2", "phase": "02"}])
        );

        let preview = std::fs::read_to_string(tmp.path().join("history_preview.txt")).unwrap();
        assert_eq!(
            preview,
            "=== Record 1 ===\nid: 1\npage_id: 5\ncontent: line1 line2\nphase: 02\n\n\n"
        );
    }

    #[tokio::test]
    async fn test_missing_table() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(tmp.path(), &["CREATE TABLE page (id INTEGER)"]).await;
        let output = tmp.path().join("history.json");

        let err = cmd_extract_history(&path, &output, "history").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_empty_table_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(tmp.path(), &[OLD_HISTORY_SCHEMA]).await;
        let output = tmp.path().join("history.json");

        let stats = cmd_extract_history(&path, &output, "history").await.unwrap();
        assert_eq!(stats.records, 0);
        assert!(stats.output_file.is_none());
        assert!(!output.exists());
        assert!(!tmp.path().join("history_preview.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_database() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone.sqlite3");
        let output = tmp.path().join("history.json");

        let err = cmd_extract_history(&missing, &output, "history")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("gone.sqlite3"));
        assert!(!output.exists());
    }
}
