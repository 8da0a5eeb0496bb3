//! Engine error types.
//!
//! Storage problems surface as [`ProgressError::Storage`]. Malformed
//! lesson identifiers are never errors: the unlock rules fall back to
//! treating such lessons as open.

use finempoder_store::StoreError;

/// Unified error type for the progress engine.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// The persistent store failed (I/O, quota, busy). Never retried here.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// A module key string did not name a known course module.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// A calendar policy string was neither `local` nor `utc`.
    #[error("unknown calendar policy: {0}")]
    UnknownCalendar(String),
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, ProgressError>;
