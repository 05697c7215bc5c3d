//! History import: legacy history rows into the target store

use crate::config::Config;
use crate::error::{Error, Result};
use crate::legacy::{LegacyDb, LegacyRow, LegacyValue};
use crate::normalize::{normalize_text, CONTENT_FIELD};
use crate::phase::Phase;
use crate::progress::LoadProgress;
use crate::resolve::PageResolver;
use crate::store::{NewHistory, TargetDb};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Columns a history record is built from
pub const HISTORY_COLUMNS: [&str; 4] = ["id", "content", "phase", "page_id"];

/// Foreign key column, the only one that must be present
pub const PAGE_ID_COLUMN: &str = "page_id";

const PHASE_COLUMN: &str = "phase";

/// Statistics from a history import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStats {
    pub legacy_db: String,
    pub table: String,
    pub columns: Vec<String>,
    pub records_found: usize,
    pub imported: usize,
    pub skipped: usize,
    pub placeholders_created: Vec<i64>,
}

/// Import history from the configured legacy database
///
/// Rows already written stay in place if a later row fails.
pub async fn cmd_import_history(config: &Config, db: &TargetDb) -> Result<ImportStats> {
    let legacy_path = config.legacy_db_path();
    let legacy = LegacyDb::open(&legacy_path).await?;
    info!("Starting history data import from {}", legacy_path.display());

    let mut stats = ImportStats {
        legacy_db: legacy_path.display().to_string(),
        ..Default::default()
    };

    let result = import_history(config, &legacy, db, &mut stats).await;
    legacy.close().await;

    if let Err(e) = &result {
        if !stats.table.is_empty() {
            error!(
                table = %stats.table,
                columns = %stats.columns.join(", "),
                imported = stats.imported,
                "History import stopped: {}",
                e
            );
        }
    }
    result.map(|_| stats)
}

async fn import_history(
    config: &Config,
    legacy: &LegacyDb,
    db: &TargetDb,
    stats: &mut ImportStats,
) -> Result<()> {
    let tables = legacy.tables().await?;
    info!("Tables in old database: {}", tables.join(", "));

    stats.table = legacy.locate_table(&config.import.table_hint).await?;
    info!("Found history table: {}", stats.table);

    stats.columns = legacy.columns(&stats.table).await?;
    info!("Columns in history table: {}", stats.columns.join(", "));

    if !stats.columns.iter().any(|c| c == PAGE_ID_COLUMN) {
        return Err(Error::SchemaMismatch {
            table: stats.table.clone(),
            available: stats.columns.clone(),
            required: HISTORY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        });
    }

    let rows = legacy.rows(&stats.table).await?;
    stats.records_found = rows.len();
    info!("Found {} history items to import", rows.len());

    let mut resolver = PageResolver::new(
        db,
        config.import.default_phase,
        config.import.placeholder_name.clone(),
    );
    let progress = LoadProgress::start(rows.len(), "Importing history");

    for (index, row) in rows.iter().enumerate() {
        let Some(entry) = history_entry(config, row) else {
            warn!(record = index + 1, "Skipped history row without a usable page_id");
            stats.skipped += 1;
            progress.advance();
            continue;
        };

        if let Err(e) = load_entry(&mut resolver, db, &entry).await {
            stats.placeholders_created = resolver.created().to_vec();
            progress.abandon();
            return Err(e);
        }

        stats.imported += 1;
        progress.advance();
    }

    stats.placeholders_created = resolver.created().to_vec();
    progress.finish("History import completed");
    Ok(())
}

async fn load_entry(
    resolver: &mut PageResolver<'_>,
    db: &TargetDb,
    entry: &NewHistory,
) -> Result<()> {
    resolver.ensure_page(entry.page_id).await?;
    let id = db.insert_history(entry).await?;
    info!("Imported history item: {} for page {}", id, entry.page_id);
    Ok(())
}

/// Build the target record for a legacy row, `None` if it has no page id
fn history_entry(config: &Config, row: &LegacyRow) -> Option<NewHistory> {
    let page_id = row.get(PAGE_ID_COLUMN)?.as_integer()?;

    let content = match row.get(CONTENT_FIELD) {
        None | Some(LegacyValue::Null) => String::new(),
        Some(LegacyValue::Text(text)) => text.clone(),
        Some(other) => other.to_string(),
    };
    let content = if config.import.normalize_content && !content.is_empty() {
        normalize_text(&content)
    } else {
        content
    };

    Some(NewHistory {
        content,
        phase: row_phase(row, config.import.default_phase),
        page_id,
    })
}

fn row_phase(row: &LegacyRow, default: Phase) -> Phase {
    let parsed = match row.get(PHASE_COLUMN) {
        None | Some(LegacyValue::Null) => return default,
        Some(LegacyValue::Integer(n)) => Phase::from_integer(*n),
        Some(LegacyValue::Text(text)) => text.trim().parse(),
        Some(other) => other.to_string().parse(),
    };

    parsed.unwrap_or_else(|e| {
        warn!("{}, using phase {}", e, default);
        default
    })
}

/// Print import results
pub fn print_import_stats(stats: &ImportStats) {
    println!("\n✓ History data import completed!\n");
    println!("  Source: {} (table {})", stats.legacy_db, stats.table);
    println!("  Records found: {}", stats.records_found);
    println!("  Imported: {}", stats.imported);
    if stats.skipped > 0 {
        println!("  Skipped: {}", stats.skipped);
    }
    println!("  Placeholder pages created: {}", stats.placeholders_created.len());
}
