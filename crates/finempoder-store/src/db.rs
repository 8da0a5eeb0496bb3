//! SQLite handle shared by every FinEmpoder store.
//!
//! [`Database`] owns a single `rusqlite::Connection` behind an
//! `Arc<Mutex<>>`. Each call hops onto the blocking pool with
//! `tokio::task::spawn_blocking`, so callers may `.await` storage work
//! without stalling the runtime. Calls through one handle are serialized
//! by the mutex; a single `put` is therefore atomic with respect to
//! every other write issued through the same handle.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migration;

/// Cloneable handle to the progress database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path` and apply pragmas.
    ///
    /// Blocks on file I/O; call during startup or from `spawn_blocking`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening progress database");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::InvalidArgument(format!(
                        "cannot create data directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        Self::apply_pragmas(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database for tests and ephemeral sessions.
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory progress database");

        let conn = Connection::open_in_memory()?;
        Self::apply_pragmas(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database and bring its schema up to date.
    pub async fn open_and_migrate(path: impl AsRef<Path> + Send + 'static) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = tokio::task::spawn_blocking(move || Self::open(&path)).await??;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Apply every pending schema migration.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        self.execute(migration::run_all).await
    }

    /// Run `f` against the connection on the blocking pool.
    ///
    /// ```ignore
    /// let n: i64 = db.execute(|conn| {
    ///     Ok(conn.query_row("SELECT count(*) FROM lesson_progress", [], |r| r.get(0))?)
    /// }).await?;
    /// ```
    pub async fn execute<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            f(&conn)
        })
        .await?
    }

    /// Run `f` inside an immediate write transaction.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so a
    /// read-modify-write inside `f` cannot interleave with another
    /// process writing the same file. The transaction commits only when
    /// `f` returns `Ok`; any error rolls it back.
    pub async fn transaction<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
        .await?
    }

    // ── pragmas ──────────────────────────────────────────────────────

    fn apply_pragmas(conn: &Connection) -> StoreResult<()> {
        debug!("applying SQLite pragmas");

        // WAL keeps readers unblocked while a completion is being written.
        conn.pragma_update(None, "journal_mode", "WAL")?;

        // NORMAL under WAL can lose the last commit on power loss, never corrupt.
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Another process holding the file (a second app window) makes us
        // wait instead of failing immediately.
        conn.pragma_update(None, "busy_timeout", 5_000_i32)?;

        debug!("database pragmas applied (WAL, busy_timeout 5s)");
        Ok(())
    }
}

// ── tests ────────────────────────────────────────────────────────────
