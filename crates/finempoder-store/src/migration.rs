//! Versioned schema migrations.
//!
//! Each migration is a static SQL batch keyed by version. Applied
//! versions are recorded in `_migrations`, so running the set again is a
//! no-op.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in order. Append only.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "offline progress: lesson_progress, streak, pending_actions, app_state",
    sql: r#"
        CREATE TABLE lesson_progress (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            module_id    TEXT NOT NULL,
            lesson_id    TEXT NOT NULL,
            completed    BOOLEAN NOT NULL DEFAULT 0,
            completed_at TEXT,
            score        INTEGER CHECK (score BETWEEN 0 AND 100),
            updated_at   TEXT NOT NULL,
            UNIQUE (module_id, lesson_id)
        );
        CREATE INDEX idx_lesson_progress_module ON lesson_progress(module_id);

        CREATE TABLE streak (
            id          INTEGER PRIMARY KEY CHECK (id = 1),
            current     INTEGER NOT NULL DEFAULT 0 CHECK (current >= 0),
            best        INTEGER NOT NULL DEFAULT 0 CHECK (best >= current),
            last_active TEXT
        );

        CREATE TABLE pending_actions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            action_id   TEXT NOT NULL UNIQUE,
            type        TEXT NOT NULL CHECK (type IN ('CREATE','UPDATE','DELETE')),
            resource    TEXT NOT NULL,
            payload     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX idx_pending_actions_resource ON pending_actions(resource);

        CREATE TABLE app_state (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
    "#,
}];

// ── public API ───────────────────────────────────────────────────────

/// Run all pending migrations against `conn`.
///
/// Synchronous; call it from `spawn_blocking` or through
/// [`Database::run_migrations`](crate::Database::run_migrations).
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    ensure_migrations_table(conn)?;

    let current = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    if pending.is_empty() {
        debug!(current_version = current, "progress schema is up to date");
        return Ok(());
    }

    info!(
        current_version = current,
        pending = pending.len(),
        "running pending migrations"
    );

    for migration in pending {
        apply(conn, migration)?;
    }

    info!(
        new_version = latest_version(),
        "all migrations applied"
    );
    Ok(())
}

/// Latest applied version, or 0 on a fresh database.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| StoreError::Migration {
        version: 0,
        message: format!("failed to read current version: {e}"),
    })
}

/// Highest version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

// ── internals ────────────────────────────────────────────────────────

fn ensure_migrations_table(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        );",
    )
    .map_err(|e| StoreError::Migration {
        version: 0,
        message: format!("failed to create _migrations table: {e}"),
    })
}

/// Apply one migration inside its own transaction.
fn apply(conn: &Connection, migration: &Migration) -> StoreResult<()> {
    info!(
        version = migration.version,
        description = migration.description,
        "applying migration"
    );

    // `conn.transaction()` needs `&mut Connection`; drive it by hand.
    conn.execute_batch("BEGIN IMMEDIATE;")
        .map_err(|e| StoreError::Migration {
            version: migration.version,
            message: format!("failed to begin transaction: {e}"),
        })?;

    let result = (|| -> StoreResult<()> {
        conn.execute_batch(migration.sql)
            .map_err(|e| StoreError::Migration {
                version: migration.version,
                message: format!("SQL execution failed: {e}"),
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                migration.version,
                migration.description,
                chrono::Utc::now().timestamp()
            ],
        )
        .map_err(|e| StoreError::Migration {
            version: migration.version,
            message: format!("failed to record migration: {e}"),
        })?;

        Ok(())
    })();

    match &result {
        Ok(()) => {
            conn.execute_batch("COMMIT;")
                .map_err(|e| StoreError::Migration {
                    version: migration.version,
                    message: format!("failed to commit: {e}"),
                })?;
            debug!(version = migration.version, "migration committed");
        }
        Err(err) => {
            warn!(version = migration.version, %err, "migration failed, rolling back");
            let _ = conn.execute_batch("ROLLBACK;");
        }
    }

    result
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const LATEST_VERSION: u32 = 1;

    fn setup_conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type='table' \
                 AND name NOT LIKE '\\_%' ESCAPE '\\' AND name NOT LIKE 'sqlite%' ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(window[1].version > window[0].version);
        }
        assert_eq!(latest_version(), LATEST_VERSION);
    }

    #[test]
    fn run_all_on_fresh_db() {
        let conn = setup_conn();
        run_all(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
        assert_eq!(
            table_names(&conn),
            vec!["app_state", "lesson_progress", "pending_actions", "streak"]
        );
    }

    #[test]
    fn run_all_is_idempotent() {
        let conn = setup_conn();
        run_all(&conn).unwrap();
        run_all(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn lesson_pair_is_unique() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        conn.execute(
            "INSERT INTO lesson_progress (module_id, lesson_id, completed, updated_at) \
             VALUES ('ahorro', 'L01', 1, '2024-01-01T00:00:00.000Z')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO lesson_progress (module_id, lesson_id, completed, updated_at) \
             VALUES ('ahorro', 'L01', 1, '2024-01-01T00:00:00.000Z')",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn streak_is_single_row_and_best_bounds_current() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        assert!(
            conn.execute("INSERT INTO streak (id, current, best) VALUES (2, 0, 0)", [])
                .is_err()
        );
        assert!(
            conn.execute("INSERT INTO streak (id, current, best) VALUES (1, 3, 2)", [])
                .is_err()
        );
        conn.execute("INSERT INTO streak (id, current, best) VALUES (1, 2, 3)", [])
            .unwrap();
    }

    #[test]
    fn pending_action_type_is_checked() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        let bad = conn.execute(
            "INSERT INTO pending_actions (action_id, type, resource, payload, created_at) \
             VALUES ('a-1', 'UPSERT', 'budget', '{}', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn rows_require_client_id_and_update_time() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        let no_action_id = conn.execute(
            "INSERT INTO pending_actions (type, resource, payload, created_at) \
             VALUES ('CREATE', 'budget', '{}', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(no_action_id.is_err());

        let no_updated_at = conn.execute(
            "INSERT INTO lesson_progress (module_id, lesson_id, completed) VALUES ('ahorro', 'L01', 1)",
            [],
        );
        assert!(no_updated_at.is_err());
    }
}
