//! Key-value persistence gateway and its implementations.
//!
//! # Responsibility
//! - Store and load opaque serialized blobs under fixed string keys.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `store` replaces the previous value in one statement; readers never
//!   observe a partial write.
//! - `load` returns `Ok(None)` for keys that were never written.

use crate::db::{open_db, DbError, DbResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence failure. Never fatal for the app; callers fall back to
/// in-memory state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend could not be reached or the read/write failed.
    Unavailable(String),
    /// A value exists under `key` but cannot be decoded.
    Corrupt { key: String, message: String },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::Corrupt { key, message } => {
                write!(f, "stored value `{key}` is corrupt: {message}")
            }
        }
    }
}

impl Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(value.to_string())
    }
}

/// Durable key-value store used by `TodoStore`.
pub trait PersistenceGateway {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    fn store(&self, key: &str, value: &[u8]) -> StorageResult<()>;
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for &G {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn store(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).store(key, value)
    }
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for Box<G> {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn store(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).store(key, value)
    }
}

/// SQLite-backed gateway over the `kv_entries` table.
pub struct SqliteKvRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvRepository<'conn> {
    /// Wraps a migrated connection (see `db::open_db`).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersistenceGateway for SqliteKvRepository<'_> {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn store(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

/// SQLite gateway that owns its connection, for stores that live as long as
/// the process.
pub struct SqliteKvFile {
    conn: Connection,
}

impl SqliteKvFile {
    /// Opens (and migrates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }
}

impl PersistenceGateway for SqliteKvFile {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        SqliteKvRepository::new(&self.conn).load(key)
    }

    fn store(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        SqliteKvRepository::new(&self.conn).store(key, value)
    }
}

/// Process-local gateway.
///
/// Serves as the fallback when the database cannot be opened, and as a test
/// double that can be switched offline.
#[derive(Debug)]
pub struct MemoryKvRepository {
    entries: RefCell<BTreeMap<String, Vec<u8>>>,
    /// `Some(reason)` while every read and write fails.
    offline: RefCell<Option<String>>,
}

impl Default for MemoryKvRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKvRepository {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            offline: RefCell::new(None),
        }
    }

    /// Creates a store that rejects every access with `reason`.
    ///
    /// Used when durable storage cannot be opened: the caller keeps its state
    /// in memory and every write reports `StorageError::Unavailable`.
    pub fn offline(reason: impl Into<String>) -> Self {
        let repo = Self::new();
        repo.offline.replace(Some(reason.into()));
        repo
    }

    /// Simulates the backend going offline (`false`) or recovering (`true`).
    pub fn set_available(&self, available: bool) {
        let reason = (!available).then(|| "in-memory store is offline".to_string());
        self.offline.replace(reason);
    }

    /// Returns a copy of the raw value under `key`, bypassing availability.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.borrow().get(key).cloned()
    }

    fn ensure_available(&self, key: &str) -> StorageResult<()> {
        match self.offline.borrow().as_deref() {
            None => Ok(()),
            Some(reason) => {
                warn!("event=kv_access module=repo status=error backend=memory key={key} error_code=offline");
                Err(StorageError::Unavailable(reason.to_string()))
            }
        }
    }
}

impl PersistenceGateway for MemoryKvRepository {
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.ensure_available(key)?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn store(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.ensure_available(key)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
