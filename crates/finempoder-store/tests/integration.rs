//! Integration tests for the finempoder-store crate.
//!
//! These exercise the full database lifecycle (migrations, lesson
//! progress, streak, pending actions, app state) against a real SQLite
//! file on disk (via tempfile).

use chrono::{NaiveDate, TimeZone, Utc};
use finempoder_store::{
    ActionType, AppStateStore, Database, LessonProgressStore, PendingActionLog, StreakRecord,
    StreakStore,
};
use serde_json::json;

// ═══════════════════════════════════════════════════════════════════════
//  Database lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn open_and_migrate_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("finempoder.db");

    let db = Database::open_and_migrate(db_path.clone()).await.unwrap();
    let count: i64 = db
        .execute(|conn| {
            Ok(conn.query_row("SELECT count(*) FROM pending_actions", [], |row| row.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert!(db_path.exists());
}

#[tokio::test]
async fn open_and_migrate_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("finempoder.db");

    let db1 = Database::open_and_migrate(db_path.clone()).await.unwrap();
    drop(db1);

    let db2 = Database::open_and_migrate(db_path).await.unwrap();
    let version = db2
        .execute(|conn| finempoder_store::migration::current_version(conn))
        .await
        .unwrap();
    assert_eq!(version, finempoder_store::migration::latest_version());
}

// ═══════════════════════════════════════════════════════════════════════
//  Everything persists across reopen
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("finempoder.db");
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 18, 30, 0).unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

    {
        let db = Database::open_and_migrate(db_path.clone()).await.unwrap();
        LessonProgressStore::new(db.clone())
            .set_completed("presupuesto", "L01", Some(100), now)
            .await
            .unwrap();
        StreakStore::new(db.clone())
            .put(StreakRecord {
                current: 4,
                best: 6,
                last_active: Some(day),
            })
            .await
            .unwrap();
        PendingActionLog::new(db.clone())
            .enqueue(ActionType::Create, "budget", json!({"category": "food"}), now)
            .await
            .unwrap();
        AppStateStore::new(db).set_onboarded(now).await.unwrap();
    }

    let db = Database::open_and_migrate(db_path).await.unwrap();

    let rec = LessonProgressStore::new(db.clone())
        .get("presupuesto", "L01")
        .await
        .unwrap()
        .unwrap();
    assert!(rec.completed);
    assert_eq!(rec.completed_at, Some(now));
    assert_eq!(rec.score, Some(100));

    let streak = StreakStore::new(db.clone()).get().await.unwrap();
    assert_eq!(streak.current, 4);
    assert_eq!(streak.best, 6);
    assert_eq!(streak.last_active, Some(day));

    let pending = PendingActionLog::new(db.clone()).list().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].resource, "budget");
    assert_eq!(pending[0].payload, json!({"category": "food"}));

    assert_eq!(AppStateStore::new(db).onboarded_at().await.unwrap(), Some(now));
}

// ═══════════════════════════════════════════════════════════════════════
//  Two handles on one file (e.g. two processes) share the streak
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_streak_updates_from_two_handles_are_not_lost() {
    const PER_HANDLE: u32 = 50;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("finempoder.db");
    let first = StreakStore::new(Database::open_and_migrate(db_path.clone()).await.unwrap());
    let second = StreakStore::new(Database::open(&db_path).unwrap());

    let mut tasks = Vec::new();
    for store in [first.clone(), second] {
        for _ in 0..PER_HANDLE {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .update_with(|prev| StreakRecord {
                        current: prev.current + 1,
                        best: prev.best.max(prev.current + 1),
                        last_active: prev.last_active,
                    })
                    .await
            }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let streak = first.get().await.unwrap();
    assert_eq!(streak.current, 2 * PER_HANDLE);
    assert_eq!(streak.best, 2 * PER_HANDLE);
}

// ═══════════════════════════════════════════════════════════════════════
//  Storage failures surface to the caller
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn failed_write_is_reported_and_not_persisted() {
    let db = Database::open_in_memory().unwrap();
    db.run_migrations().await.unwrap();
    let store = LessonProgressStore::new(db.clone());
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();

    db.execute(|conn| {
        conn.execute_batch(
            "CREATE TRIGGER fail_progress BEFORE INSERT ON lesson_progress \
             BEGIN SELECT RAISE(ABORT, 'quota exceeded'); END;",
        )?;
        Ok(())
    })
    .await
    .unwrap();

    let err = store
        .set_completed("ahorro", "L01", None, now)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
    assert!(!store.is_completed("ahorro", "L01").await.unwrap());
}
