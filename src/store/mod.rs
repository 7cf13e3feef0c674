//! The persistent index store: a thin wrapper over a single
//! `rusqlite::Connection` with a two-table schema (`file`, `sindex`)
//! and a `PRAGMA user_version` gate against opening a store built by
//! an older schema.

pub mod files;
pub mod records;
pub mod remove;
pub mod schema;
pub mod staging;

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::Connection;

use schema::{SCHEMA_SQL, SCHEMA_VERSION};

pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (or create) the store at `db_path`: create the parent
    /// directory, open the connection, then either lay down a fresh
    /// schema (new file) or check the `user_version` gate (existing
    /// file). Creation is reserved for callers with write intent
    /// (`add`); read-only callers should use `open_existing` instead so
    /// a never-built index is reported as a clear error rather than
    /// silently fabricated on disk.
    pub fn open(db_path: &Path) -> Result<Self> {
        let is_new = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let conn = Self::connect(db_path)?;
        let store = Self { conn };

        if is_new {
            store.create_schema()?;
        } else {
            store.check_schema_version()?;
        }

        Ok(store)
    }

    /// Open the store at `db_path` without ever creating it. Errors if
    /// the file does not exist, which is what `search`/`rm` should do
    /// against an index that was never `add`-ed rather than reporting
    /// an empty result set from a database they just fabricated.
    pub fn open_existing(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            bail!(
                "no index found at {} (run `add` first to build one)",
                db_path.display()
            );
        }

        let conn = Self::connect(db_path)?;
        let store = Self { conn };
        store.check_schema_version()?;
        Ok(store)
    }

    fn connect(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open store: {}", db_path.display()))?;

        conn.pragma_update(None, "foreign_keys", "ON")
            .context("failed to enable foreign_keys")?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("failed to set journal_mode=WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(60))
            .context("failed to set busy_timeout")?;

        Ok(conn)
    }

    /// Open an in-memory store (used by unit tests that don't need a
    /// real filesystem path).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory store")?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("failed to enable foreign_keys")?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .context("failed to initialize store schema")?;
        self.conn
            .pragma_update(None, "user_version", SCHEMA_VERSION)
            .context("failed to set schema version")?;
        Ok(())
    }

    fn check_schema_version(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .context("failed to read schema version")?;
        if version < SCHEMA_VERSION {
            return Err(anyhow!(
                "store schema is too old (found version {version}, need {SCHEMA_VERSION}); rebuild the index"
            ));
        }
        Ok(())
    }

    /// Run `f` inside a write transaction, committing on success and
    /// rolling back on error or panic unwind. Used for both the
    /// staging-table publication and the per-stream file-identity
    /// update.
    pub fn with_write_txn<T>(&mut self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = self.conn.transaction().context("failed to begin transaction")?;
        let result = f(&tx)?;
        tx.commit().context("failed to commit transaction")?;
        Ok(result)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
