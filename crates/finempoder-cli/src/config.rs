//! Runtime configuration.
//!
//! Reads the `[progress]` section of `config/default.toml`, then applies
//! environment overrides (`FINEMPODER_DB`, `FINEMPODER_CALENDAR`). A
//! missing file or section falls back to defaults.
//!
//! Loading runs before tracing is installed, so problems are collected
//! as warnings for the caller to log afterwards.

use std::path::{Path, PathBuf};

use finempoder_core::CalendarPolicy;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Settings for the progress engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file holding progress, streak and pending actions.
    pub database_path: PathBuf,
    /// Calendar used to decide "today" for streaks.
    pub calendar: CalendarPolicy,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/finempoder.db"),
            calendar: CalendarPolicy::Local,
            log_level: "info".to_string(),
        }
    }
}

/// Load `config/default.toml` plus environment overrides.
pub fn load() -> (AppConfig, Vec<String>) {
    let mut warnings = Vec::new();
    let mut config = load_from_path(Path::new(DEFAULT_CONFIG_PATH), &mut warnings);
    apply_env(
        &mut config,
        std::env::var("FINEMPODER_DB").ok(),
        std::env::var("FINEMPODER_CALENDAR").ok(),
        &mut warnings,
    );
    (config, warnings)
}

/// Parse the `[progress]` section of the file at `path`.
pub fn load_from_path(path: &Path, warnings: &mut Vec<String>) -> AppConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content, warnings),
        Err(_) => AppConfig::default(),
    }
}

fn parse(content: &str, warnings: &mut Vec<String>) -> AppConfig {
    let defaults = AppConfig::default();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(err) => {
            warnings.push(format!("invalid config file, using defaults: {err}"));
            return defaults;
        }
    };

    let progress = match table.get("progress") {
        Some(toml::Value::Table(p)) => p,
        _ => return defaults,
    };

    let calendar = match progress.get("calendar").and_then(|v| v.as_str()) {
        Some(raw) => raw.parse::<CalendarPolicy>().unwrap_or_else(|err| {
            warnings.push(format!("ignoring progress.calendar: {err}"));
            defaults.calendar
        }),
        None => defaults.calendar,
    };

    AppConfig {
        database_path: progress
            .get("database_path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path),
        calendar,
        log_level: progress
            .get("log_level")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or(defaults.log_level),
    }
}

fn apply_env(
    config: &mut AppConfig,
    db: Option<String>,
    calendar: Option<String>,
    warnings: &mut Vec<String>,
) {
    if let Some(db) = db.filter(|v| !v.trim().is_empty()) {
        config.database_path = PathBuf::from(db);
    }
    if let Some(raw) = calendar {
        match raw.parse::<CalendarPolicy>() {
            Ok(policy) => config.calendar = policy,
            Err(err) => warnings.push(format!("ignoring FINEMPODER_CALENDAR: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let mut warnings = Vec::new();
        let cfg = load_from_path(Path::new("/nonexistent/finempoder.toml"), &mut warnings);
        assert_eq!(cfg, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn reads_progress_section() {
        let mut warnings = Vec::new();
        let cfg = parse(
            r#"
            [progress]
            database_path = "/tmp/fe.db"
            calendar = "utc"
            log_level = "debug"
            "#,
            &mut warnings,
        );
        assert_eq!(cfg.database_path, PathBuf::from("/tmp/fe.db"));
        assert_eq!(cfg.calendar, CalendarPolicy::Utc);
        assert_eq!(cfg.log_level, "debug");
        assert!(warnings.is_empty());
    }

    #[test]
    fn bad_values_fall_back_per_field() {
        let mut warnings = Vec::new();
        let cfg = parse(
            r#"
            [progress]
            calendar = "martian"
            "#,
            &mut warnings,
        );
        assert_eq!(cfg.calendar, CalendarPolicy::Local);
        assert_eq!(cfg.database_path, AppConfig::default().database_path);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("martian"));
    }

    #[test]
    fn malformed_toml_gives_defaults() {
        let mut warnings = Vec::new();
        assert_eq!(parse("[progress", &mut warnings), AppConfig::default());
        assert!(warnings[0].starts_with("invalid config file"));
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        std::fs::write(&path, "[progress]\ndatabase_path = \"a.db\"\n").unwrap();

        let mut warnings = Vec::new();
        let mut cfg = load_from_path(&path, &mut warnings);
        apply_env(&mut cfg, Some("b.db".into()), Some("utc".into()), &mut warnings);
        assert_eq!(cfg.database_path, PathBuf::from("b.db"));
        assert_eq!(cfg.calendar, CalendarPolicy::Utc);
        assert!(warnings.is_empty());

        apply_env(&mut cfg, Some("  ".into()), Some("bogus".into()), &mut warnings);
        assert_eq!(cfg.database_path, PathBuf::from("b.db"));
        assert_eq!(cfg.calendar, CalendarPolicy::Utc);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("FINEMPODER_CALENDAR"));
    }
}
