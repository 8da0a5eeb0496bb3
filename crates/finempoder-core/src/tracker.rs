//! The progress service handed to lesson screens.
//!
//! [`ProgressTracker`] owns the store handles and keeps two layers of
//! completion state:
//!
//! - **believed**: an in-memory [`DashMap`] updated synchronously the
//!   moment a lesson's completion predicate is met, so the UI can react
//!   immediately;
//! - **persisted**: the SQLite store, written right after.
//!
//! Writes are fire-and-forget. A storage failure is logged and swallowed;
//! the believed layer then says "completed" while the store does not,
//! until [`ProgressTracker::hydrate`] reloads the module from disk.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use finempoder_store::{
    ActionType, Database, LessonProgress, LessonProgressStore, PendingAction, PendingActionLog,
    StreakStore,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::compute_progress;
use crate::error::Result;
use crate::snapshot::Completions;
use crate::streak::{CalendarPolicy, StreakSnapshot, advance};
use crate::unlock::{LessonState, module_states, next_available};

type LessonKey = (String, String);

fn key(module_id: &str, lesson_id: &str) -> LessonKey {
    (module_id.to_string(), lesson_id.to_string())
}

/// Result of [`ProgressTracker::complete_lesson`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// `false` when the lesson was already believed completed; nothing
    /// else happened in that case.
    pub newly_completed: bool,
    /// Whether the completion reached the store.
    pub persisted: bool,
    /// The write failed because the device ran out of space.
    pub quota_exceeded: bool,
    /// Streak after this activity, if it could be recorded.
    pub streak: Option<StreakSnapshot>,
}

impl CompletionOutcome {
    const DUPLICATE: Self = Self {
        newly_completed: false,
        persisted: false,
        quota_exceeded: false,
        streak: None,
    };
}

/// Display-ready summary of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleOverview {
    pub module_id: String,
    /// 0..=100.
    pub percentage: u8,
    pub lessons: Vec<(String, LessonState)>,
    /// First open lesson not yet completed.
    pub next_lesson: Option<String>,
}

/// Progress service: construct once at startup, share by clone.
#[derive(Clone)]
pub struct ProgressTracker {
    progress: LessonProgressStore,
    streaks: StreakStore,
    pending: PendingActionLog,
    calendar: CalendarPolicy,
    believed: Arc<DashMap<LessonKey, DateTime<Utc>>>,
}

impl ProgressTracker {
    pub fn new(db: Database, calendar: CalendarPolicy) -> Self {
        Self {
            progress: LessonProgressStore::new(db.clone()),
            streaks: StreakStore::new(db.clone()),
            pending: PendingActionLog::new(db),
            calendar,
            believed: Arc::new(DashMap::new()),
        }
    }

    /// Calendar used to decide "today".
    pub fn calendar(&self) -> CalendarPolicy {
        self.calendar
    }

    // ── completion ───────────────────────────────────────────────────

    /// Record that a lesson's completion predicate was satisfied.
    ///
    /// Only the first call per lesson does anything. It marks the
    /// lesson believed-complete, persists it, then counts the activity
    /// towards the streak. Storage failures are logged and reported in
    /// the outcome, never returned as errors.
    pub async fn complete_lesson(
        &self,
        module_id: &str,
        lesson_id: &str,
        score: Option<u8>,
        now: DateTime<Utc>,
    ) -> CompletionOutcome {
        match self.believed.entry(key(module_id, lesson_id)) {
            Entry::Occupied(_) => {
                debug!(module_id, lesson_id, "completion already recorded, ignoring");
                return CompletionOutcome::DUPLICATE;
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }

        let (persisted, quota_exceeded) = match self
            .progress
            .set_completed(module_id, lesson_id, score, now)
            .await
        {
            Ok(()) => (true, false),
            Err(err) => {
                let quota = err.is_quota_exceeded();
                warn!(module_id, lesson_id, quota, %err, "failed to persist lesson completion");
                (false, quota)
            }
        };

        let streak = match self.record_activity(module_id, now).await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(module_id, %err, "failed to record study activity");
                None
            }
        };

        info!(module_id, lesson_id, persisted, "lesson completed");
        CompletionOutcome {
            newly_completed: true,
            persisted,
            quota_exceeded,
            streak,
        }
    }

    /// Optimistic view: completed in this session or loaded by `hydrate`.
    pub fn believes_completed(&self, module_id: &str, lesson_id: &str) -> bool {
        self.believed.contains_key(&key(module_id, lesson_id))
    }

    /// Authoritative view: the last successfully persisted value.
    pub async fn is_completed(&self, module_id: &str, lesson_id: &str) -> Result<bool> {
        Ok(self.progress.is_completed(module_id, lesson_id).await?)
    }

    /// Persisted records for a module, in no particular order.
    pub async fn module_progress(&self, module_id: &str) -> Result<Vec<LessonProgress>> {
        Ok(self.progress.module_progress(module_id).await?)
    }

    /// Replace the believed state for `module_id` with what is on disk.
    ///
    /// Returns the number of completed lessons loaded. Completions that
    /// never reached the store are dropped, so they can be attempted again.
    pub async fn hydrate(&self, module_id: &str) -> Result<usize> {
        let records = self.progress.module_progress(module_id).await?;

        self.believed.retain(|(m, _), _| m != module_id);
        let mut loaded = 0;
        for rec in records.into_iter().filter(|r| r.completed) {
            let at = rec.completed_at.unwrap_or_else(Utc::now);
            self.believed.insert((rec.module_id, rec.lesson_id), at);
            loaded += 1;
        }
        debug!(module_id, loaded, "believed progress hydrated from store");
        Ok(loaded)
    }

    /// Completion snapshot for a module: persisted records plus anything
    /// believed in memory. Falls back to the believed layer alone when
    /// the store cannot be read.
    pub async fn completions(&self, module_id: &str) -> Completions {
        let mut done = match self.progress.module_progress(module_id).await {
            Ok(records) => Completions::from_records(&records),
            Err(err) => {
                warn!(module_id, %err, "failed to read module progress, using in-memory state");
                Completions::new()
            }
        };
        for entry in self.believed.iter() {
            let (m, lesson) = entry.key();
            if m == module_id {
                done.insert(lesson.clone());
            }
        }
        done
    }

    /// Percentage and per-lesson navigation state for a module.
    pub async fn module_overview<S: AsRef<str>>(
        &self,
        module_id: &str,
        lessons: &[S],
    ) -> ModuleOverview {
        let done = self.completions(module_id).await;
        ModuleOverview {
            module_id: module_id.to_string(),
            percentage: compute_progress(lessons, &done),
            lessons: module_states(lessons, &done),
            next_lesson: next_available(lessons, &done),
        }
    }

    // ── streak ───────────────────────────────────────────────────────

    /// Count one activity on the calendar day containing `now`.
    ///
    /// Repeated calls on the same day leave the streak unchanged.
    pub async fn record_activity(
        &self,
        module_id: &str,
        now: DateTime<Utc>,
    ) -> Result<StreakSnapshot> {
        let today = self.calendar.day_of(now);
        let record = self
            .streaks
            .update_with(move |prev| advance(prev, today))
            .await?;
        debug!(module_id, current = record.current, best = record.best, "activity recorded");
        Ok(StreakSnapshot::new(record, today))
    }

    /// Current streak as seen on the day containing `now`.
    pub async fn streak(&self, now: DateTime<Utc>) -> Result<StreakSnapshot> {
        let record = self.streaks.get().await?;
        Ok(StreakSnapshot::new(record, self.calendar.day_of(now)))
    }

    // ── offline actions ──────────────────────────────────────────────

    /// Queue a mutation for later delivery to the remote API.
    ///
    /// Returns `None` (after logging) when the log could not be written.
    pub async fn enqueue_offline(
        &self,
        action_type: ActionType,
        resource: &str,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Option<PendingAction> {
        match self.pending.enqueue(action_type, resource, payload, now).await {
            Ok(action) => Some(action),
            Err(err) => {
                warn!(%action_type, resource, %err, "failed to queue offline action");
                None
            }
        }
    }

    /// Queued actions in replay order.
    pub async fn pending_actions(&self) -> Result<Vec<PendingAction>> {
        Ok(self.pending.list().await?)
    }
}
