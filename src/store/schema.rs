//! SQLite schema definition

/// SQL schema for the target database
pub const SCHEMA_SQL: &str = r#"
-- Pages: one per archive page, ids are kept stable across migrations
CREATE TABLE IF NOT EXISTS page (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    phase TEXT NOT NULL
);

-- Media: images and videos found in the phase folders
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    phase TEXT NOT NULL,
    path TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('image', 'video')),
    page_id INTEGER NOT NULL REFERENCES page(id)
);

-- History: free-text entries per page and phase
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    phase TEXT NOT NULL DEFAULT '01',
    page_id INTEGER NOT NULL REFERENCES page(id)
);

-- Cache entries for the database cache backend
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at INTEGER
);

-- Indexes for phase lookups
CREATE INDEX IF NOT EXISTS idx_media_phase ON media(phase);
CREATE INDEX IF NOT EXISTS idx_history_phase ON history(phase);
CREATE INDEX IF NOT EXISTS idx_history_page ON history(page_id);
"#;
