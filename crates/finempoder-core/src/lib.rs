//! FinEmpoder progress engine.
//!
//! Everything here works offline against the local store:
//!
//! - **[`catalog`]**: the shipped modules and their ordered lessons.
//! - **[`aggregate`]**: module completion percentage.
//! - **[`unlock`]**: which lessons the learner may open.
//! - **[`streak`]**: consecutive-day streak rules and the calendar policy.
//! - **[`tracker`]**: [`ProgressTracker`], the service lesson screens call.
//!   It pairs an optimistic in-memory layer with the persistent store.
//! - **[`error`]**: [`ProgressError`] via [`thiserror`].
//!
//! `aggregate`, `unlock` and `streak` are pure functions over snapshots
//! and hold no state of their own.

pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod snapshot;
pub mod streak;
pub mod tracker;
pub mod unlock;

pub use aggregate::compute_progress;
pub use catalog::{LessonDef, LessonKind, ModuleKey, order_index};
pub use error::{ProgressError, Result};
pub use snapshot::Completions;
pub use streak::{CalendarPolicy, StreakSnapshot, advance, today_done};
pub use tracker::{CompletionOutcome, ModuleOverview, ProgressTracker};
pub use unlock::{LessonState, is_unlocked, lesson_state, module_states, next_available};
