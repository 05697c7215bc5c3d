//! File outputs: JSON documents and plain-text previews

use crate::error::Result;
use crate::legacy::LegacyRow;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// One table of a whole-database dump
#[derive(Debug, Clone, Serialize)]
pub struct TableDump {
    pub columns: Vec<String>,
    pub data: Vec<LegacyRow>,
}

/// Whole-database dump, serialized as `{table: {columns, data}}` in
/// discovery order
#[derive(Debug, Clone, Default)]
pub struct DatabaseDump {
    tables: Vec<(String, TableDump)>,
}

impl DatabaseDump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: impl Into<String>, dump: TableDump) {
        self.tables.push((table.into(), dump));
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableDump)> {
        self.tables.iter().map(|(name, dump)| (name.as_str(), dump))
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|(_, dump)| dump.data.len()).sum()
    }
}

impl Serialize for DatabaseDump {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for (name, dump) in &self.tables {
            map.serialize_entry(name, dump)?;
        }
        map.end()
    }
}

/// Write `value` as two-space indented JSON in a single write
///
/// The document is fully rendered before the file is touched, so a
/// serialization failure leaves no file behind.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    info!("Wrote {:?}", path);
    Ok(())
}

/// `<stem>_preview.txt` next to `output`
pub fn preview_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{}_preview.txt", stem))
}

/// Render rows as `=== Record N ===` blocks of `field: value` lines
pub fn render_preview(rows: &[LegacyRow]) -> String {
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let _ = writeln!(out, "=== Record {} ===", i + 1);
        for (field, value) in row.iter() {
            let _ = writeln!(out, "{}: {}", field, value);
        }
        out.push_str("\n\n");
    }
    out
}

/// Write the preview text file for `rows`
pub fn write_preview(path: &Path, rows: &[LegacyRow]) -> Result<()> {
    std::fs::write(path, render_preview(rows))?;
    info!("Wrote preview {:?}", path);
    Ok(())
}
