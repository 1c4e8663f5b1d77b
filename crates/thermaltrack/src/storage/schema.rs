//! `SQLite` schema definitions for thermaltrack.
//!
//! The store is a plain key-value table: each row holds one whole collection
//! serialized as a JSON array.

/// SQL statement to create the collections table.
pub const CREATE_COLLECTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS collections (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to insert or replace a collection document.
pub const UPSERT_COLLECTION: &str = r"
INSERT INTO collections (key, value, updated_at)
VALUES (?1, ?2, datetime('now'))
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_COLLECTIONS_TABLE];
