//! # finempoder-store
//!
//! Offline storage engine for FinEmpoder.
//!
//! Everything the learner does while disconnected lands in one SQLite
//! file (WAL mode) that survives restarts:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  LessonProgressStore  (lesson_progress)      │
//! │  StreakStore          (streak, single row)   │
//! │  PendingActionLog     (pending_actions)      │
//! │  AppStateStore        (app_state)            │
//! ├──────────────────────────────────────────────┤
//! │  Database (rusqlite WAL, spawn_blocking)     │
//! │  Migrations (versioned, transactional)       │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use finempoder_store::{Database, LessonProgressStore};
//!
//! let db = Database::open_and_migrate("data/finempoder.db").await?;
//! let progress = LessonProgressStore::new(db.clone());
//! progress.set_completed("presupuesto", "L01", None, chrono::Utc::now()).await?;
//! ```

pub mod app_state;
pub mod db;
pub mod error;
pub mod migration;
pub mod pending;
pub mod progress;
pub mod streak;

// ── re-exports ───────────────────────────────────────────────────────

pub use app_state::AppStateStore;
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use pending::{ActionType, PendingAction, PendingActionLog};
pub use progress::{LessonProgress, LessonProgressStore};
pub use streak::{StreakRecord, StreakStore};
