//! Lesson-completion records.
//!
//! [`LessonProgressStore`] is the only reader and writer of the
//! `lesson_progress` table. One row exists per `(module_id, lesson_id)`
//! pair; completion is an upsert against that unique key, so repeated
//! calls leave exactly one completed row behind.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// Durable completion record for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    /// Course module, e.g. `presupuesto`.
    pub module_id: String,
    /// Lesson code within the module, e.g. `L01`.
    pub lesson_id: String,
    /// Once true, never reset by this store.
    pub completed: bool,
    /// First time the lesson was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Optional quiz/simulator score, 0..=100.
    pub score: Option<u8>,
    /// Time of the most recent completion call.
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidArgument(format!("bad timestamp {raw:?}: {e}")))
}

/// Raw row before timestamp parsing.
struct ProgressRow {
    module_id: String,
    lesson_id: String,
    completed: bool,
    completed_at: Option<String>,
    score: Option<u8>,
    updated_at: String,
}

impl ProgressRow {
    const COLUMNS: &'static str = "module_id, lesson_id, completed, completed_at, score, updated_at";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            module_id: row.get(0)?,
            lesson_id: row.get(1)?,
            completed: row.get(2)?,
            completed_at: row.get(3)?,
            score: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_progress(self) -> StoreResult<LessonProgress> {
        Ok(LessonProgress {
            module_id: self.module_id,
            lesson_id: self.lesson_id,
            completed: self.completed,
            completed_at: self.completed_at.as_deref().map(parse_ts).transpose()?,
            score: self.score,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  LessonProgressStore
// ═══════════════════════════════════════════════════════════════════════

/// Repository over the `lesson_progress` table.
#[derive(Clone)]
pub struct LessonProgressStore {
    db: Database,
}

impl LessonProgressStore {
    /// Create a repository backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Mark a lesson completed.
    ///
    /// Inserts the row on first call and updates it in place afterwards.
    /// `completed_at` keeps the first completion time; `updated_at`
    /// advances on every call. A `score` replaces the stored one only
    /// when supplied.
    #[instrument(skip(self))]
    pub async fn set_completed(
        &self,
        module_id: &str,
        lesson_id: &str,
        score: Option<u8>,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        if let Some(s) = score {
            if s > 100 {
                return Err(StoreError::InvalidArgument(format!(
                    "score must be within 0..=100, got {s}"
                )));
            }
        }

        let module_id = module_id.to_string();
        let lesson_id = lesson_id.to_string();
        let now = format_ts(now);

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO lesson_progress (module_id, lesson_id, completed, completed_at, score, updated_at) \
                     VALUES (?1, ?2, 1, ?3, ?4, ?3) \
                     ON CONFLICT(module_id, lesson_id) DO UPDATE SET \
                         completed = 1, \
                         completed_at = COALESCE(lesson_progress.completed_at, excluded.completed_at), \
                         score = COALESCE(excluded.score, lesson_progress.score), \
                         updated_at = excluded.updated_at",
                    rusqlite::params![module_id, lesson_id, now, score],
                )?;
                debug!(module_id = %module_id, lesson_id = %lesson_id, "lesson marked completed");
                Ok(())
            })
            .await
    }

    /// Whether the lesson has a completed record. `false` if none exists.
    #[instrument(skip(self))]
    pub async fn is_completed(&self, module_id: &str, lesson_id: &str) -> StoreResult<bool> {
        Ok(self
            .get(module_id, lesson_id)
            .await?
            .is_some_and(|p| p.completed))
    }

    /// Fetch the record for one `(module, lesson)` pair.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        module_id: &str,
        lesson_id: &str,
    ) -> StoreResult<Option<LessonProgress>> {
        let module_id = module_id.to_string();
        let lesson_id = lesson_id.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    &format!(
                        "SELECT {} FROM lesson_progress WHERE module_id = ?1 AND lesson_id = ?2",
                        ProgressRow::COLUMNS
                    ),
                    rusqlite::params![module_id, lesson_id],
                    ProgressRow::from_row,
                );
                match result {
                    Ok(row) => row.into_progress().map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// All records for a module. Callers must not rely on the order.
    #[instrument(skip(self))]
    pub async fn module_progress(&self, module_id: &str) -> StoreResult<Vec<LessonProgress>> {
        let module_id = module_id.to_string();
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM lesson_progress WHERE module_id = ?1",
                    ProgressRow::COLUMNS
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![module_id], ProgressRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows.into_iter().map(ProgressRow::into_progress).collect()
            })
            .await
    }

    /// Wipe every completion record and the streak.
    ///
    /// QA tooling only; normal operation never deletes progress.
    #[instrument(skip(self))]
    pub async fn reset_all(&self) -> StoreResult<usize> {
        self.db
            .transaction(|tx| {
                let removed = tx.execute("DELETE FROM lesson_progress", [])?;
                tx.execute("DELETE FROM streak", [])?;
                warn!(removed, "all lesson progress and streak data erased");
                Ok(removed)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
