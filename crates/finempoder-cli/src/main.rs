//! CLI entry point for FinEmpoder.
//!
//! The `finempoder` binary drives the offline progress engine against a
//! local database: completing lessons, showing module progress and
//! streaks, and inspecting the offline action queue.

mod cli;
mod config;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use finempoder_core::{LessonState, ModuleKey, ProgressTracker, StreakSnapshot};
use finempoder_store::{ActionType, AppStateStore, Database, LessonProgressStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let (mut config, warnings) = config::load();
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    init_tracing(&config.log_level);
    for warning in &warnings {
        warn!("{warning}");
    }

    let db = Database::open_and_migrate(config.database_path.clone())
        .await
        .with_context(|| {
            format!(
                "failed to open database at {}",
                config.database_path.display()
            )
        })?;
    let tracker = ProgressTracker::new(db.clone(), config.calendar);
    info!(path = %config.database_path.display(), calendar = %tracker.calendar(), "store initialized");

    match cli.command {
        Commands::Complete {
            module,
            lesson,
            score,
        } => cmd_complete(&tracker, &module, &lesson, score).await,
        Commands::Status { module } => cmd_status(&tracker, module.as_deref()).await,
        Commands::Activity { module } => cmd_activity(&tracker, &module).await,
        Commands::Streak => cmd_streak(&tracker).await,
        Commands::Enqueue {
            action,
            resource,
            payload,
        } => cmd_enqueue(&tracker, &action, &resource, &payload).await,
        Commands::Pending => cmd_pending(&tracker).await,
        Commands::Onboard { done, clear } => cmd_onboard(&db, done, clear).await,
        Commands::Reset { yes } => cmd_reset(&db, yes).await,
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_module(raw: &str) -> Result<ModuleKey> {
    raw.parse::<ModuleKey>()
        .with_context(|| "expected one of: presupuesto, ahorro, inversion")
}

fn print_streak(streak: &StreakSnapshot) {
    let last = streak
        .last_active
        .map(|d| d.to_string())
        .unwrap_or_else(|| "never".to_string());
    let today = if streak.today_done { "  (done today)" } else { "" };
    println!(
        "  Streak: {} day(s), best {}, last active {last}{today}",
        streak.current, streak.best
    );
}

// ---------------------------------------------------------------------------
// Subcommand: complete
// ---------------------------------------------------------------------------

async fn cmd_complete(
    tracker: &ProgressTracker,
    module: &str,
    lesson: &str,
    score: Option<u8>,
) -> Result<()> {
    let module = parse_module(module)?;
    let lesson = lesson.trim().to_ascii_uppercase();
    let Some(def) = module.lesson(&lesson) else {
        bail!("module {module} has no lesson {lesson}");
    };

    tracker
        .hydrate(module.as_str())
        .await
        .context("failed to load saved progress")?;

    let lessons = module.lesson_ids();
    let overview = tracker.module_overview(module.as_str(), &lessons).await;
    let state = overview
        .lessons
        .iter()
        .find(|(id, _)| *id == lesson)
        .map(|(_, s)| *s)
        .unwrap_or(LessonState::Available);
    if state == LessonState::Locked {
        bail!(
            "lesson {lesson} is locked; next open lesson is {}",
            overview.next_lesson.as_deref().unwrap_or("-")
        );
    }

    let outcome = tracker
        .complete_lesson(module.as_str(), &lesson, score, Utc::now())
        .await;

    if !outcome.newly_completed {
        println!("  {module}/{lesson} \"{}\" was already completed.", def.title);
        return Ok(());
    }

    println!("  Completed {module}/{lesson}: {}", def.title);
    if outcome.quota_exceeded {
        println!("  Warning: device storage is full; this completion will be lost on restart.");
    } else if !outcome.persisted {
        println!("  Warning: progress could not be saved; it will be lost on restart.");
    }
    if let Some(streak) = &outcome.streak {
        print_streak(streak);
    }

    let overview = tracker.module_overview(module.as_str(), &lessons).await;
    println!("  Module progress: {}%", overview.percentage);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

async fn cmd_status(tracker: &ProgressTracker, module: Option<&str>) -> Result<()> {
    let modules = match module {
        Some(raw) => vec![parse_module(raw)?],
        None => ModuleKey::ALL.to_vec(),
    };

    for module in modules {
        let lessons = module.lesson_ids();
        let overview = tracker.module_overview(module.as_str(), &lessons).await;

        println!();
        println!("  {module} -- {}%", overview.percentage);
        for (id, state) in &overview.lessons {
            let title = module.lesson(id).map(|l| l.title).unwrap_or("");
            let marker = match state {
                LessonState::Completed => "[x]",
                LessonState::Available => "[ ]",
                LessonState::Locked => "[-]",
            };
            println!("    {marker} {id}  {:<10} {title}", state.label());
        }
    }

    println!();
    print_streak(&tracker.streak(Utc::now()).await?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommands: activity / streak
// ---------------------------------------------------------------------------

async fn cmd_activity(tracker: &ProgressTracker, module: &str) -> Result<()> {
    let module = parse_module(module)?;
    let streak = tracker
        .record_activity(module.as_str(), Utc::now())
        .await
        .context("failed to record activity")?;
    print_streak(&streak);
    Ok(())
}

async fn cmd_streak(tracker: &ProgressTracker) -> Result<()> {
    let streak = tracker.streak(Utc::now()).await?;
    print_streak(&streak);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommands: enqueue / pending
// ---------------------------------------------------------------------------

async fn cmd_enqueue(
    tracker: &ProgressTracker,
    action: &str,
    resource: &str,
    payload: &str,
) -> Result<()> {
    let action_type: ActionType = action.parse()?;
    let payload: serde_json::Value =
        serde_json::from_str(payload).context("payload must be valid JSON")?;

    match tracker
        .enqueue_offline(action_type, resource, payload, Utc::now())
        .await
    {
        Some(queued) => {
            println!(
                "  Queued #{} {} {} ({})",
                queued.id, queued.action_type, queued.resource, queued.action_id
            );
            Ok(())
        }
        None => bail!("could not queue action; see log for details"),
    }
}

async fn cmd_pending(tracker: &ProgressTracker) -> Result<()> {
    let actions = tracker.pending_actions().await?;
    if actions.is_empty() {
        println!("  No pending actions.");
        return Ok(());
    }
    for a in &actions {
        println!(
            "  #{:<4} {}  {:<6} {:<10} {}",
            a.id,
            a.created_at.format("%Y-%m-%d %H:%M:%S"),
            a.action_type,
            a.resource,
            a.payload
        );
    }
    println!("  {} action(s) waiting for sync.", actions.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommands: onboard / reset
// ---------------------------------------------------------------------------

async fn cmd_onboard(db: &Database, done: bool, clear: bool) -> Result<()> {
    let state = AppStateStore::new(db.clone());
    if done && !state.set_onboarded(Utc::now()).await? {
        println!("  Onboarding was already completed.");
    } else if clear && !state.clear_onboarded().await? {
        println!("  Onboarding had not been completed.");
    }
    match state.onboarded_at().await? {
        Some(at) => println!("  Onboarded: yes, since {}", at.format("%Y-%m-%d %H:%M")),
        None => println!("  Onboarded: no"),
    }
    Ok(())
}

async fn cmd_reset(db: &Database, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to erase progress without --yes");
    }
    let removed = LessonProgressStore::new(db.clone()).reset_all().await?;
    println!("  Erased {removed} lesson record(s) and the study streak.");
    Ok(())
}
