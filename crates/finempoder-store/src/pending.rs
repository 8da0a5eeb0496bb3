//! Append-only log of mutations made while offline.
//!
//! Entries are written once and never modified. Replay order is
//! `created_at` then row id. Nothing in this crate consumes the log yet;
//! [`PendingActionLog::list`] exists for inspection only.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::progress::{format_ts, parse_ts};

/// Kind of remote mutation an entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Create,
    Update,
    Delete,
}

impl ActionType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown action type: {other}"
            ))),
        }
    }
}

/// A queued mutation awaiting delivery to the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    /// Auto-increment row id.
    pub id: i64,
    /// Client-generated UUID v7, stable across replays.
    pub action_id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Logical resource, e.g. `budget`.
    pub resource: String,
    /// Opaque request body.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Writer (and read-only inspector) for `pending_actions`.
#[derive(Clone)]
pub struct PendingActionLog {
    db: Database,
}

impl PendingActionLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append an entry stamped with `now`; returns the stored entry.
    #[instrument(skip(self, payload))]
    pub async fn enqueue(
        &self,
        action_type: ActionType,
        resource: &str,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> StoreResult<PendingAction> {
        if resource.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "pending action resource must not be empty".into(),
            ));
        }

        let action_id = Uuid::now_v7().to_string();
        let resource = resource.to_string();
        let payload_json = serde_json::to_string(&payload)?;
        let created_at = format_ts(now);

        let (id, action_id, resource) = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO pending_actions (action_id, type, resource, payload, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        action_id,
                        action_type.as_str(),
                        resource,
                        payload_json,
                        created_at
                    ],
                )?;
                Ok((conn.last_insert_rowid(), action_id, resource))
            })
            .await?;

        debug!(id, action_id = %action_id, %action_type, resource = %resource, "pending action queued");

        Ok(PendingAction {
            id,
            action_id,
            action_type,
            resource,
            payload,
            created_at: now,
        })
    }

    /// Every queued entry in replay order.
    #[instrument(skip(self))]
    pub async fn list(&self) -> StoreResult<Vec<PendingAction>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, action_id, type, resource, payload, created_at \
                     FROM pending_actions ORDER BY created_at ASC, id ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(id, action_id, kind, resource, payload, created_at)| {
                        Ok::<_, StoreError>(PendingAction {
                            id,
                            action_id,
                            action_type: kind.parse()?,
                            resource,
                            payload: serde_json::from_str(&payload)?,
                            created_at: parse_ts(&created_at)?,
                        })
                    })
                    .collect()
            })
            .await
    }

    /// Number of queued entries.
    pub async fn count(&self) -> StoreResult<u64> {
        self.db
            .execute(|conn| {
                let n: i64 =
                    conn.query_row("SELECT count(*) FROM pending_actions", [], |row| row.get(0))?;
                Ok(u64::try_from(n).unwrap_or_default())
            })
            .await
    }
}
