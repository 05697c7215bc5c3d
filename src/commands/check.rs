//! Database verification report

use crate::error::Result;
use crate::legacy::LegacyDb;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Row count of one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCount {
    pub name: String,
    pub rows: i64,
}

/// Pages sharing a phase value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseCount {
    pub phase: Option<String>,
    pub pages: i64,
}

/// Verification report; project totals are unset when their table is absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckReport {
    pub db_file: String,
    pub tables: Vec<TableCount>,
    pub pages: Option<i64>,
    pub pages_by_phase: Vec<PhaseCount>,
    pub media: Option<i64>,
    pub history: Option<i64>,
}

/// Count rows of every table of `db_file`, read-only
pub async fn cmd_check_db(db_file: &Path) -> Result<CheckReport> {
    let db = LegacyDb::open(db_file).await?;
    info!("Checking database {}", db_file.display());

    let result = build_report(&db).await;
    db.close().await;

    let mut report = result?;
    report.db_file = db_file.display().to_string();
    Ok(report)
}

async fn build_report(db: &LegacyDb) -> Result<CheckReport> {
    let mut report = CheckReport::default();
    let tables = db.tables().await?;

    for name in &tables {
        report.tables.push(TableCount {
            name: name.clone(),
            rows: db.count(name).await?,
        });
    }

    let has = |table: &str| tables.iter().any(|t| t == table);

    if has("page") {
        report.pages = Some(db.count("page").await?);
        report.pages_by_phase = db
            .group_counts("page", "phase")
            .await?
            .into_iter()
            .map(|(phase, pages)| PhaseCount { phase, pages })
            .collect();
    }
    if has("media") {
        report.media = Some(db.count("media").await?);
    }
    if has("history") {
        report.history = Some(db.count("history").await?);
    }

    Ok(report)
}

fn print_total(label: &str, total: Option<i64>, unit: &str) {
    match total {
        Some(count) => println!("\n{} table: {} total {}", label, count, unit),
        None => println!("\n{} table: not found", label),
    }
}

/// Print the verification report
pub fn print_check_report(report: &CheckReport) {
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("DATABASE VERIFICATION REPORT");
    println!("{}", rule);
    println!("\nDatabase: {}", report.db_file);
    println!("Total tables: {}\n", report.tables.len());
    for table in &report.tables {
        println!("{}: {} rows", table.name, table.rows);
    }

    println!("\n{}", rule);
    println!("PROJECT-SPECIFIC TABLE DETAILS");
    println!("{}", rule);

    print_total("Page", report.pages, "pages");
    if report.pages.is_some() {
        println!("Pages by phase:");
        for group in &report.pages_by_phase {
            println!(
                "  Phase {}: {} pages",
                group.phase.as_deref().unwrap_or("NULL"),
                group.pages
            );
        }
    }
    print_total("Media", report.media, "media items");
    print_total("History", report.history, "history entries");
    println!("\n{}", rule);
}
