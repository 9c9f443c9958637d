// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded account database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser (JSON bytes)
//! - `users_by_email`: email → user_id (JSON string)
//! - `users_by_username`: username → user_id (JSON string)
//!
//! Every table stores JSON values under string keys, so one set of
//! `query` / `create` / `update` / `remove` operations serves all of them.

use std::path::Path;
use std::sync::Arc;

use redb::{ReadableDatabase, ReadableTable, TableDefinition, TableHandle, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};

use super::transaction::TransactionHandle;

// =============================================================================
// Table Definitions
// =============================================================================

/// A string-keyed table of JSON documents.
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Primary table: user_id → StoredUser.
pub const USERS: JsonTable = TableDefinition::new("users");

/// Unique index: email → user_id.
pub const USERS_BY_EMAIL: JsonTable = TableDefinition::new("users_by_email");

/// Unique index: username → user_id.
pub const USERS_BY_USERNAME: JsonTable = TableDefinition::new("users_by_username");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("transaction {0} is no longer active")]
    TransactionFinished(u64),

    #[error("blocking task failed: {0}")]
    Task(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Database
// =============================================================================

/// The process-wide shared database handle.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(USERS_BY_USERNAME)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self { db })
    }

    /// Start a write transaction. Blocks while another writer is active.
    pub(crate) fn begin_write(&self) -> DbResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    fn query<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> DbResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        get_json(&table, key)
    }

    /// Single-statement write outside any request transaction.
    fn autocommit<R>(&self, op: impl FnOnce(&WriteTransaction) -> DbResult<R>) -> DbResult<R> {
        let write_txn = self.db.begin_write()?;
        match op(&write_txn) {
            Ok(value) => {
                write_txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                write_txn.abort()?;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

// =============================================================================
// Handle
// =============================================================================

/// The database handle a call chain should use right now.
///
/// Obtained from `TransactionScope::resolve`: either the chain's active
/// transaction or the shared database. Writes through `Shared` commit
/// immediately, one statement at a time.
#[derive(Debug, Clone)]
pub enum Handle {
    Shared(Arc<Database>),
    Transaction(Arc<TransactionHandle>),
}

impl Handle {
    pub fn is_transactional(&self) -> bool {
        matches!(self, Handle::Transaction(_))
    }

    /// Read one document by key.
    pub fn query<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> DbResult<Option<T>> {
        match self {
            Handle::Shared(db) => db.query(table, key),
            Handle::Transaction(tx) => tx.with_write(|txn| {
                let table = txn.open_table(table)?;
                get_json(&table, key)
            }),
        }
    }

    /// Insert a new document; fails with `AlreadyExists` if the key is taken.
    pub fn create<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> DbResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.write(|txn| {
            let mut t = txn.open_table(table)?;
            if t.get(key)?.is_some() {
                return Err(DbError::AlreadyExists(format!("{}/{key}", table.name())));
            }
            t.insert(key, bytes.as_slice())?;
            Ok(())
        })
    }

    /// Replace an existing document; fails with `NotFound` if absent.
    pub fn update<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> DbResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.write(|txn| {
            let mut t = txn.open_table(table)?;
            if t.get(key)?.is_none() {
                return Err(DbError::NotFound(format!("{}/{key}", table.name())));
            }
            t.insert(key, bytes.as_slice())?;
            Ok(())
        })
    }

    /// Delete a document; returns whether it existed.
    pub fn remove(&self, table: JsonTable, key: &str) -> DbResult<bool> {
        self.write(|txn| {
            let mut t = txn.open_table(table)?;
            let removed = t.remove(key)?.is_some();
            Ok(removed)
        })
    }

    fn write<R>(&self, op: impl FnOnce(&WriteTransaction) -> DbResult<R>) -> DbResult<R> {
        match self {
            Handle::Shared(db) => db.autocommit(op),
            Handle::Transaction(tx) => tx.with_write(op),
        }
    }
}

fn get_json<T, R>(table: &R, key: &str) -> DbResult<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
    }

    fn temp_db() -> (Arc<Database>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.redb")).unwrap();
        (Arc::new(db), dir)
    }

    fn doc(name: &str) -> Doc {
        Doc { name: name.to_string() }
    }

    #[test]
    fn shared_create_and_query() {
        let (db, _dir) = temp_db();
        let handle = Handle::Shared(db);
        handle.create(USERS, "u1", &doc("Ash")).unwrap();

        let found: Option<Doc> = handle.query(USERS, "u1").unwrap();
        assert_eq!(found, Some(doc("Ash")));
        assert!(!handle.is_transactional());
    }

    #[test]
    fn query_missing_key_is_none() {
        let (db, _dir) = temp_db();
        let found: Option<Doc> = Handle::Shared(db).query(USERS, "nope").unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn create_rejects_duplicate_key() {
        let (db, _dir) = temp_db();
        let handle = Handle::Shared(db);
        handle.create(USERS_BY_EMAIL, "a@b.co", &"u1").unwrap();

        let err = handle.create(USERS_BY_EMAIL, "a@b.co", &"u2").unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));

        let owner: Option<String> = handle.query(USERS_BY_EMAIL, "a@b.co").unwrap();
        assert_eq!(owner.as_deref(), Some("u1"));
    }

    #[test]
    fn update_requires_existing_key() {
        let (db, _dir) = temp_db();
        let handle = Handle::Shared(db);

        let err = handle.update(USERS, "u1", &doc("Misty")).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));

        handle.create(USERS, "u1", &doc("Ash")).unwrap();
        handle.update(USERS, "u1", &doc("Misty")).unwrap();
        let found: Option<Doc> = handle.query(USERS, "u1").unwrap();
        assert_eq!(found, Some(doc("Misty")));
    }

    #[test]
    fn remove_reports_existence() {
        let (db, _dir) = temp_db();
        let handle = Handle::Shared(db);
        handle.create(USERS_BY_USERNAME, "ash", &"u1").unwrap();

        assert!(handle.remove(USERS_BY_USERNAME, "ash").unwrap());
        assert!(!handle.remove(USERS_BY_USERNAME, "ash").unwrap());
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let db = Arc::new(Database::open(&path).unwrap());
            Handle::Shared(db).create(USERS, "u1", &doc("Brock")).unwrap();
        }
        let db = Arc::new(Database::open(&path).unwrap());
        let found: Option<Doc> = Handle::Shared(db).query(USERS, "u1").unwrap();
        assert_eq!(found, Some(doc("Brock")));
    }

    #[test]
    fn open_reports_unusable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"not a directory").unwrap();

        let result = Database::open(&file.join("data").join("test.redb"));
        assert!(matches!(result, Err(DbError::Io(_))));
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("test.redb");

        Database::open(&path).unwrap();
        assert!(path.exists());
    }
}
