//! Snapshot repository contract and implementations.
//!
//! # Responsibility
//! - Persist the full task collection as one key-value snapshot.
//! - Keep SQL and JSON codec details inside the persistence boundary.
//!
//! # Invariants
//! - Serialization is deterministic for a given ordered collection, so
//!   saving a just-loaded snapshot reproduces the stored bytes.
//! - `save` is a full replacement of any prior value under the key.
//! - Session ids never appear in the stored format.

use crate::db::DbError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

/// Fixed key the serialized task collection lives under.
pub const SNAPSHOT_KEY: &str = "TASKS";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence errors for snapshot load/save operations.
#[derive(Debug)]
pub enum RepoError {
    /// A value exists under the key but cannot be decoded.
    CorruptSnapshot(String),
    /// Encoding the in-memory collection failed.
    Serialize(serde_json::Error),
    /// The backend reported a write failure.
    WriteFailed(String),
    Db(DbError),
    /// The connection mutex was poisoned by a panicking thread.
    Poisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CorruptSnapshot(message) => write!(f, "corrupt stored snapshot: {message}"),
            Self::Serialize(err) => write!(f, "snapshot serialization failed: {err}"),
            Self::WriteFailed(message) => write!(f, "snapshot write failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "snapshot store mutex poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::CorruptSnapshot(_) | Self::WriteFailed(_) | Self::Poisoned => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Wire shape of one stored task.
///
/// The persisted snapshot is a JSON array of these objects. The format is
/// fixed; adding fields here would break older stored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTask {
    pub text: String,
}

/// Encodes an ordered collection into its canonical stored form.
pub fn encode_snapshot(tasks: &[StoredTask]) -> RepoResult<String> {
    serde_json::to_string(tasks).map_err(RepoError::Serialize)
}

/// Decodes a stored value back into an ordered collection.
pub fn decode_snapshot(value: &str) -> RepoResult<Vec<StoredTask>> {
    serde_json::from_str(value).map_err(|err| {
        RepoError::CorruptSnapshot(format!("value under `{SNAPSHOT_KEY}` is not valid: {err}"))
    })
}

/// Key-value store for the serialized task collection.
pub trait SnapshotRepository {
    /// Reads the snapshot under the fixed key; `None` when absent.
    fn load(&self) -> RepoResult<Option<Vec<StoredTask>>>;

    /// Serializes the full collection and replaces any prior stored value.
    fn save(&self, tasks: &[StoredTask]) -> RepoResult<()>;
}

/// SQLite-backed snapshot repository.
///
/// Owns its connection behind a `Mutex` so one instance can be shared
/// between the caller thread (startup load) and the background writer.
pub struct SqliteSnapshotRepository {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotRepository {
    /// Wraps a bootstrapped connection (see `db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::Poisoned)
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn load(&self) -> RepoResult<Option<Vec<StoredTask>>> {
        let conn = self.lock()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_snapshots WHERE key = ?1;",
                [SNAPSHOT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(raw) => Ok(Some(decode_snapshot(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, tasks: &[StoredTask]) -> RepoResult<()> {
        let encoded = encode_snapshot(tasks)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_snapshots (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![SNAPSHOT_KEY, encoded],
        )?;
        Ok(())
    }
}

/// In-memory snapshot repository for tests and previews.
///
/// Mirrors the durable contract over a mutex-guarded cell, exposes the raw
/// stored value, and can inject save failures to exercise retry handling.
#[derive(Default)]
pub struct MemorySnapshotRepository {
    value: Mutex<Option<String>>,
    fail_saves: AtomicU32,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` save calls fail with `WriteFailed`.
    pub fn fail_next_saves(&self, count: u32) {
        self.fail_saves.store(count, Ordering::SeqCst);
    }

    /// Replaces the raw stored value, bypassing the codec.
    ///
    /// Lets tests stage absent, valid, or corrupt stored states.
    pub fn set_stored_value(&self, value: Option<String>) {
        if let Ok(mut cell) = self.value.lock() {
            *cell = value;
        }
    }

    /// Returns the raw stored value as the durable-bytes observer.
    pub fn stored_value(&self) -> Option<String> {
        self.value.lock().ok().and_then(|cell| cell.clone())
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load(&self) -> RepoResult<Option<Vec<StoredTask>>> {
        let cell = self.value.lock().map_err(|_| RepoError::Poisoned)?;
        match cell.as_deref() {
            Some(raw) => Ok(Some(decode_snapshot(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, tasks: &[StoredTask]) -> RepoResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) > 0 {
            self.fail_saves.fetch_sub(1, Ordering::SeqCst);
            return Err(RepoError::WriteFailed("injected failure".to_string()));
        }
        let encoded = encode_snapshot(tasks)?;
        let mut cell = self.value.lock().map_err(|_| RepoError::Poisoned)?;
        *cell = Some(encoded);
        Ok(())
    }
}
