//! Storage layer for thermaltrack.
//!
//! Collections are persisted as whole JSON documents under a string key:
//! `transformers`, `images` and `inspections`. Every mutation rewrites the
//! full document for its collection; there is no partial update and no
//! schema version.
//!
//! Two stores implement [`CollectionStore`]:
//! - [`Storage`], backed by a `SQLite` key-value table
//! - [`MemoryStore`], a map used by tests and dry runs

pub mod schema;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use schema::{SCHEMA_STATEMENTS, UPSERT_COLLECTION};

/// A durable key-value store holding serialized collections.
pub trait CollectionStore: std::fmt::Debug {
    /// Read the raw document stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn load_raw(&self, key: &str) -> Result<Option<String>>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Nothing is retried.
    fn save_raw(&self, key: &str, value: &str) -> Result<()>;

    /// List the keys that currently hold a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Load the collection stored under `key`.
///
/// A missing key yields an empty collection. So does a document that is not
/// a JSON array; the failure is logged and the stored value is left untouched
/// until the next save overwrites it. Inside an array, each record is read on
/// its own: records that do not fit `T` are logged and skipped, the rest load
/// in order.
///
/// # Errors
///
/// Returns an error only if the store itself cannot be read.
pub fn load_collection<T: DeserializeOwned>(
    store: &dyn CollectionStore,
    key: &str,
) -> Result<Vec<T>> {
    let Some(raw) = store.load_raw(key)? else {
        debug!("No stored document for {key}");
        return Ok(Vec::new());
    };

    let values = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
        Ok(values) => values,
        Err(e) => {
            warn!("Stored {key} document is unreadable, starting empty: {e}");
            return Ok(Vec::new());
        }
    };

    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable record {idx} in {key}: {e}");
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!(
            "Loaded {} of {total} records from {key}; the skipped ones are dropped on the next save",
            records.len()
        );
    } else {
        debug!("Loaded {total} records from {key}");
    }
    Ok(records)
}

/// Serialize `records` and store them under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_collection<T: Serialize>(
    store: &dyn CollectionStore,
    key: &str,
    records: &[T],
) -> Result<()> {
    let raw = serde_json::to_string(records)?;
    store.save_raw(key, &raw)?;
    debug!("Saved {} records to {key} ({} bytes)", records.len(), raw.len());
    Ok(())
}

/// Size of one stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    /// Storage key.
    pub key: String,
    /// Number of records in the stored document (0 if unreadable).
    pub records: usize,
    /// Size of the stored document in bytes.
    pub bytes: usize,
}

/// Describe the document stored under `key`.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn collection_stats(store: &dyn CollectionStore, key: &str) -> Result<CollectionStats> {
    let raw = store.load_raw(key)?.unwrap_or_default();
    let records = serde_json::from_str::<Vec<serde_json::Value>>(&raw)
        .map(|v| v.len())
        .unwrap_or(0);
    Ok(CollectionStats {
        key: key.to_string(),
        records,
        bytes: raw.len(),
    })
}

/// `SQLite`-backed collection store.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the database file in bytes (0 for in-memory databases).
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        }
    }
}

fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

impl CollectionStore for Storage {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM collections WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(UPSERT_COLLECTION, (key, value))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM collections ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

/// In-memory collection store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a raw document in place, bypassing serialization.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }
}

impl CollectionStore for MemoryStore {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}
