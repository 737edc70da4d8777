// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Observability configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Console log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging options for [`crate::init_logging`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingOptions {
    /// Log level for crates without a debug flag (trace, debug, info, warn, error)
    pub level: String,

    pub console_format: LogFormat,

    /// Base directory for run folders
    pub log_dir: PathBuf,

    /// Write JSON log files (requires the `file-logging` feature)
    pub file_logging: bool,

    /// Keep N most recent run folders
    pub retention_runs: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_format: LogFormat::Text,
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            retention_runs: 10,
        }
    }
}
