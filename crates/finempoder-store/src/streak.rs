//! Persistence for the single process-wide study streak.
//!
//! The `streak` table holds at most one row (`id = 1`). Updates go
//! through [`StreakStore::update_with`], which reads, transforms and
//! writes the row inside one immediate transaction so `current`, `best`
//! and `last_active` always change together.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stored streak counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    /// Consecutive active days ending today or yesterday.
    pub current: u32,
    /// Highest `current` ever observed.
    pub best: u32,
    /// Calendar day of the most recent activity.
    pub last_active: Option<NaiveDate>,
}

fn read(conn: &rusqlite::Connection) -> StoreResult<StreakRecord> {
    let result = conn.query_row(
        "SELECT current, best, last_active FROM streak WHERE id = 1",
        [],
        |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        },
    );
    match result {
        Ok((current, best, last_active)) => {
            let last_active = last_active
                .map(|raw| {
                    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
                        StoreError::InvalidArgument(format!("bad streak date {raw:?}: {e}"))
                    })
                })
                .transpose()?;
            Ok(StreakRecord {
                current,
                best,
                last_active,
            })
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(StreakRecord::default()),
        Err(e) => Err(e.into()),
    }
}

fn write(conn: &rusqlite::Connection, record: &StreakRecord) -> StoreResult<()> {
    if record.best < record.current {
        return Err(StoreError::InvalidArgument(format!(
            "streak best ({}) below current ({})",
            record.best, record.current
        )));
    }
    let last_active = record
        .last_active
        .map(|d| d.format(DATE_FORMAT).to_string());
    conn.execute(
        "INSERT INTO streak (id, current, best, last_active) VALUES (1, ?1, ?2, ?3) \
         ON CONFLICT(id) DO UPDATE SET current = excluded.current, best = excluded.best, \
         last_active = excluded.last_active",
        rusqlite::params![record.current, record.best, last_active],
    )?;
    Ok(())
}

/// Repository over the one-row `streak` table.
#[derive(Clone)]
pub struct StreakStore {
    db: Database,
}

impl StreakStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Current counters; zero/absent before the first activity.
    #[instrument(skip(self))]
    pub async fn get(&self) -> StoreResult<StreakRecord> {
        self.db.execute(read).await
    }

    /// Overwrite the counters.
    #[instrument(skip(self))]
    pub async fn put(&self, record: StreakRecord) -> StoreResult<()> {
        self.db.execute(move |conn| write(conn, &record)).await
    }

    /// Atomically replace the record with `f(previous)` and return the result.
    pub async fn update_with<F>(&self, f: F) -> StoreResult<StreakRecord>
    where
        F: FnOnce(StreakRecord) -> StreakRecord + Send + 'static,
    {
        self.db
            .transaction(move |tx| {
                let previous = read(tx)?;
                let next = f(previous);
                write(tx, &next)?;
                debug!(
                    current = next.current,
                    best = next.best,
                    last_active = ?next.last_active,
                    "streak updated"
                );
                Ok(next)
            })
            .await
    }
}
