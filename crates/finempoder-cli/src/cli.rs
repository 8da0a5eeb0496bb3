//! CLI argument definitions for FinEmpoder.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FinEmpoder -- offline course progress and study streaks.
#[derive(Parser)]
#[command(
    name = "finempoder",
    version,
    about = "FinEmpoder -- offline course progress and study streaks",
    long_about = "Records lesson completions, module progress and daily study streaks in a \
                  local database that works without a network connection."
)]
pub struct Cli {
    /// Database file (overrides config and FINEMPODER_DB).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mark a lesson as completed and count today's activity.
    Complete {
        /// Module key: presupuesto, ahorro or inversion.
        module: String,
        /// Lesson code, e.g. L03.
        lesson: String,
        /// Score obtained (0-100).
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=100))]
        score: Option<u8>,
    },

    /// Show module progress and which lessons are open.
    Status {
        /// Limit output to one module.
        module: Option<String>,
    },

    /// Record a study activity without completing a lesson.
    Activity {
        /// Module the activity belongs to.
        module: String,
    },

    /// Show the current study streak.
    Streak,

    /// Queue a mutation for the remote API while offline.
    Enqueue {
        /// create, update or delete.
        action: String,
        /// Logical resource, e.g. budget.
        resource: String,
        /// JSON payload.
        payload: String,
    },

    /// List queued offline actions in replay order.
    Pending,

    /// Show or change the onboarding flag.
    Onboard {
        /// Mark onboarding as done.
        #[arg(long, conflicts_with = "clear")]
        done: bool,
        /// Forget that onboarding was done.
        #[arg(long)]
        clear: bool,
    },

    /// Erase all lesson progress and the streak (QA only).
    Reset {
        /// Confirm the erase.
        #[arg(long)]
        yes: bool,
    },
}
