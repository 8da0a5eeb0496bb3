//! Onboarding state.
//!
//! The learner finishes the welcome flow once per install. The time it
//! happened is kept in the `app_state` table under a single key, so the
//! flag survives restarts and offline periods.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::StoreResult;
use crate::progress::{format_ts, parse_ts};

const ONBOARDED_AT: &str = "onboarded_at";

/// Onboarding flag over the `app_state` table.
#[derive(Clone)]
pub struct AppStateStore {
    db: Database,
}

impl AppStateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// When onboarding was first completed, if ever.
    #[instrument(skip(self))]
    pub async fn onboarded_at(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .db
            .execute(|conn| {
                let result = conn.query_row(
                    "SELECT value FROM app_state WHERE key = ?1",
                    rusqlite::params![ONBOARDED_AT],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;
        raw.as_deref().map(parse_ts).transpose()
    }

    pub async fn is_onboarded(&self) -> StoreResult<bool> {
        Ok(self.onboarded_at().await?.is_some())
    }

    /// Mark onboarding as done at `now`. A second call keeps the first
    /// time and returns `false`.
    #[instrument(skip(self))]
    pub async fn set_onboarded(&self, now: DateTime<Utc>) -> StoreResult<bool> {
        let stamp = format_ts(now);
        self.db
            .execute(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO app_state (key, value) VALUES (?1, ?2) \
                     ON CONFLICT(key) DO NOTHING",
                    rusqlite::params![ONBOARDED_AT, stamp],
                )?;
                if inserted > 0 {
                    debug!(at = %stamp, "onboarding completed");
                }
                Ok(inserted > 0)
            })
            .await
    }

    /// Forget onboarding (used when re-testing the welcome flow); `true`
    /// if it had been done.
    pub async fn clear_onboarded(&self) -> StoreResult<bool> {
        self.db
            .execute(|conn| {
                let deleted = conn.execute(
                    "DELETE FROM app_state WHERE key = ?1",
                    rusqlite::params![ONBOARDED_AT],
                )?;
                Ok(deleted > 0)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    async fn setup() -> AppStateStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        AppStateStore::new(db)
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn fresh_install_is_not_onboarded() {
        let store = setup().await;
        assert!(!store.is_onboarded().await.unwrap());
        assert!(store.onboarded_at().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_onboarding_time_is_kept() {
        let store = setup().await;
        assert!(store.set_onboarded(at(9)).await.unwrap());
        assert!(!store.set_onboarded(at(15)).await.unwrap());
        assert_eq!(store.onboarded_at().await.unwrap(), Some(at(9)));
    }

    #[tokio::test]
    async fn clear_allows_onboarding_again() {
        let store = setup().await;
        store.set_onboarded(at(9)).await.unwrap();

        assert!(store.clear_onboarded().await.unwrap());
        assert!(!store.clear_onboarded().await.unwrap());
        assert!(!store.is_onboarded().await.unwrap());

        store.set_onboarded(at(11)).await.unwrap();
        assert_eq!(store.onboarded_at().await.unwrap(), Some(at(11)));
    }
}
