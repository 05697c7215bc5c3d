//! Dump command implementation

use crate::error::Result;
use crate::legacy::LegacyDb;
use crate::sink::{write_json, DatabaseDump, TableDump};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Per-table summary of a dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: usize,
    pub rows: usize,
}

/// Statistics from a dump
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpStats {
    pub db_file: String,
    pub output_file: String,
    pub tables: Vec<TableSummary>,
    pub total_rows: usize,
}

/// Dump every user table of `db_file` to `output` as JSON
///
/// Nothing is written unless every table was read.
pub async fn cmd_dump(db_file: &Path, output: &Path) -> Result<DumpStats> {
    let db = LegacyDb::open(db_file).await?;
    info!("Dumping database: {}", db_file.display());

    let result = read_all_tables(&db).await;
    db.close().await;
    let dump = result?;

    write_json(output, &dump)?;
    info!("Database dump completed: {}", output.display());

    Ok(DumpStats {
        db_file: db_file.display().to_string(),
        output_file: output.display().to_string(),
        tables: dump
            .tables()
            .map(|(name, table)| TableSummary {
                name: name.to_string(),
                columns: table.columns.len(),
                rows: table.data.len(),
            })
            .collect(),
        total_rows: dump.total_rows(),
    })
}

async fn read_all_tables(db: &LegacyDb) -> Result<DatabaseDump> {
    let mut dump = DatabaseDump::new();
    for table in db.tables().await? {
        info!("Processing table: {}", table);
        let columns = db.columns(&table).await?;
        let data = db.rows(&table).await?;
        dump.push(table, TableDump { columns, data });
    }
    Ok(dump)
}

/// Print dump results
pub fn print_dump_stats(stats: &DumpStats) {
    println!("\n✓ Database dump completed: {}\n", stats.output_file);
    for table in &stats.tables {
        println!(
            "  {}: {} rows, {} columns",
            table.name, table.rows, table.columns
        );
    }
    println!("\n  Tables: {}", stats.tables.len());
    println!("  Total rows: {}", stats.total_rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_legacy_db, OLD_HISTORY_SCHEMA};
    use serde_json::Value;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_dump_matches_direct_query() {
        let tmp = TempDir::new().unwrap();
        let path = create_legacy_db(
            tmp.path(),
            &[
                "CREATE TABLE page (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, phase TEXT)",
                OLD_HISTORY_SCHEMA,
                "INSERT INTO page (name, phase) VALUES ('a', '01'), ('b', '02')",
                "INSERT INTO old_history VALUES (1, 1, 'x', '01')",
            ],
        )
        .await;
        let output = tmp.path().join("dump.json");

        let stats = cmd_dump(&path, &output).await.unwrap();
        assert_eq!(stats.total_rows, 3);

        let reloaded: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let tables = reloaded.as_object().unwrap();
        assert_eq!(tables.len(), 2);
        assert!(!tables.contains_key("sqlite_sequence"));

        let db = LegacyDb::open(&path).await.unwrap();
        for (name, table) in tables {
            let columns: Vec<String> = table["columns"]
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c.as_str().unwrap().to_string())
                .collect();
            assert_eq!(columns, db.columns(name).await.unwrap());

            let data = table["data"].as_array().unwrap();
            assert_eq!(data.len() as i64, db.count(name).await.unwrap());
            for row in data {
                let keys: Vec<&String> = row.as_object().unwrap().keys().collect();
                assert_eq!(keys.len(), columns.len());
            }
        }
        db.close().await;

        assert_eq!(tables["page"]["data"][1]["name"], "b");
        assert_eq!(tables["old_history"]["data"][0]["page_id"], 1);
    }

    #[tokio::test]
    async fn test_missing_database_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("absent.sqlite3");
        let output = tmp.path().join("dump.json");

        let err = cmd_dump(&missing, &output).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("absent.sqlite3"));
        assert!(!output.exists());
    }
}
