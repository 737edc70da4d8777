// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # meanfield-observability
//!
//! Logging setup shared by every meanfield binary, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known meanfield crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "meanfield",
    "meanfield-config",
    "meanfield-neural",
    "meanfield-engine",
    "meanfield-observability",
];
