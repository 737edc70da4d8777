// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization
//!
//! Console output goes to stderr so that stdout stays free for results. With
//! the `file-logging` feature, JSON log files are written to a timestamped run
//! folder and old run folders are pruned.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, TimeZone, Utc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingOptions};

const RUN_FOLDER_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps file writers alive; logs are flushed when this is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder of this process, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Initialize the global subscriber
///
/// Creates a timestamped folder structure when file logging is enabled:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       ├── meanfield-engine.log
///       ├── meanfield-config.log
///       └── meanfield.log (combined)
/// ```
///
/// # Errors
///
/// Fails if the run folder cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let flags = debug_flags.clone().with_base_level(&options.level);
    let filter = flags.to_filter_string();
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console_layer = match options.console_format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(env_filter.clone())
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .with_filter(env_filter.clone())
            .boxed(),
    };
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guards, log_dir) = if options.file_logging {
        let (file_layers, guards, run_folder) = file_layers(options, &env_filter)?;
        layers.extend(file_layers);
        (guards, Some(run_folder))
    } else {
        (Vec::new(), None)
    };

    #[cfg(not(feature = "file-logging"))]
    let log_dir: Option<PathBuf> = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    #[cfg(not(feature = "file-logging"))]
    {
        if options.file_logging {
            tracing::warn!("[LOGGING] File logging requested but the file-logging feature is disabled");
        }
    }

    if let Some(dir) = &log_dir {
        tracing::info!("[LOGGING] Writing logs to {}", dir.display());
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir,
    })
}

#[cfg(feature = "file-logging")]
fn file_layers(
    options: &LoggingOptions,
    env_filter: &EnvFilter,
) -> Result<(Vec<BoxedLayer>, Vec<tracing_appender::non_blocking::WorkerGuard>, PathBuf)> {
    use tracing_appender::rolling;

    let run_folder = options.log_dir.join(run_folder_name(Utc::now()));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_logs(&options.log_dir, options.retention_runs.max(1))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    for crate_name in crate::KNOWN_CRATES {
        let appender = rolling::never(&run_folder, format!("{}.log", crate_name));
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let target = crate_name.replace('-', "_");
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(EnvFilter::new(format!("{}=debug,off", target)))
            .boxed();
        layers.push(layer);
    }

    let combined = rolling::never(&run_folder, "meanfield.log");
    let (writer, guard) = tracing_appender::non_blocking(combined);
    guards.push(guard);
    layers.push(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(env_filter.clone())
            .boxed(),
    );

    Ok((layers, guards, run_folder))
}

#[cfg_attr(not(feature = "file-logging"), allow(dead_code))]
fn run_folder_name(now: chrono::DateTime<Utc>) -> String {
    format!("{}{}", RUN_FOLDER_PREFIX, now.format(RUN_TIMESTAMP_FORMAT))
}

/// Remove all but the `retention_runs` most recent run folders
///
/// Directories whose names do not parse as `run_YYYYmmdd_HHMMSS` are left
/// alone. Returns the number of removed folders.
pub fn cleanup_old_logs(base_log_dir: &Path, retention_runs: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs = Vec::new();
    let entries = std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to read log directory: {}", base_log_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(stamp) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_FOLDER_PREFIX))
        else {
            continue;
        };
        if let Ok(naive) = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT) {
            runs.push((path, Utc.from_utc_datetime(&naive)));
        }
    }

    if runs.len() <= retention_runs {
        return Ok(0);
    }

    // Oldest first
    runs.sort_by_key(|(_, started)| *started);
    let excess = runs.len() - retention_runs;
    let mut removed = 0;
    for (path, _) in runs.into_iter().take(excess) {
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

/// Initialize logging with default options
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_runs(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::create_dir_all(dir.join(name)).unwrap();
        }
    }

    #[test]
    fn test_run_folder_name() {
        let naive = NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap();
        assert_eq!(run_folder_name(Utc.from_utc_datetime(&naive)), "run_20250307_090501");
    }

    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempfile::tempdir().unwrap();
        make_runs(
            dir.path(),
            &[
                "run_20250101_120000",
                "run_20250102_120000",
                "run_20241231_235959",
                "run_20250103_080000",
            ],
        );

        let removed = cleanup_old_logs(dir.path(), 2).unwrap();
        assert_eq!(removed, 2);
        assert!(!dir.path().join("run_20241231_235959").exists());
        assert!(!dir.path().join("run_20250101_120000").exists());
        assert!(dir.path().join("run_20250102_120000").exists());
        assert!(dir.path().join("run_20250103_080000").exists());
    }

    #[test]
    fn test_cleanup_ignores_foreign_entries() {
        let dir = tempfile::tempdir().unwrap();
        make_runs(dir.path(), &["run_20250101_120000", "run_latest", "archive"]);
        std::fs::write(dir.path().join("run_20240101_000000"), b"not a folder").unwrap();

        let removed = cleanup_old_logs(dir.path(), 0).unwrap();
        assert_eq!(removed, 1);
        assert!(dir.path().join("run_latest").exists());
        assert!(dir.path().join("archive").exists());
        assert!(dir.path().join("run_20240101_000000").exists());
    }

    #[test]
    fn test_cleanup_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_old_logs(&missing, 3).unwrap(), 0);
    }
}
