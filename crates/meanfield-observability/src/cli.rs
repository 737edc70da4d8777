// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-meanfield-engine` to raise one crate to debug
//! level while the rest stay at the base level.

use std::collections::HashMap;
use std::env;

use crate::KNOWN_CRATES;

/// Per-crate debug flags and the base level for everything else
///
/// # Example
/// ```rust
/// use meanfield_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-meanfield-engine".to_string()]);
/// assert!(flags.is_enabled("meanfield-engine"));
/// ```
#[derive(Debug, Clone)]
pub struct CrateDebugFlags {
    pub enabled_crates: HashMap<String, bool>,
    pub base_level: String,
}

impl Default for CrateDebugFlags {
    fn default() -> Self {
        Self {
            enabled_crates: HashMap::new(),
            base_level: "info".to_string(),
        }
    }
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}` pattern.
    /// Also supports `--debug-all` to enable all crates.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string(), true);
            }
        }
        flags
    }

    /// Level applied to crates without a debug flag
    pub fn with_base_level(mut self, level: &str) -> Self {
        self.base_level = level.to_lowercase();
        self
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string(), true);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains_key(crate_name)
    }

    /// Get all enabled crates
    pub fn enabled_crates(&self) -> Vec<&String> {
        self.enabled_crates.keys().collect()
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for flagged crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Filter directives for `EnvFilter`
    ///
    /// Crate names are converted to their target form (`meanfield-engine` becomes
    /// `meanfield_engine`). Format: `"meanfield_engine=debug,info"`.
    pub fn to_filter_string(&self) -> String {
        let mut crates: Vec<&String> = self.enabled_crates.keys().collect();
        crates.sort();

        let mut filters: Vec<String> = crates
            .into_iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.push(self.base_level.clone());
        filters.join(",")
    }
}

/// Apply a `MEANFIELD_DEBUG`-style value: `all` or comma-separated crate names
pub fn apply_debug_env(flags: &mut CrateDebugFlags, value: &str) {
    if value.trim() == "all" {
        flags.enable_all();
        return;
    }
    for crate_name in value.split(',') {
        let crate_name = crate_name.trim();
        if !crate_name.is_empty() {
            flags.enabled_crates.insert(crate_name.to_string(), true);
        }
    }
}

/// Parse debug flags from the process arguments and `MEANFIELD_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var("MEANFIELD_DEBUG") {
        apply_debug_env(&mut flags, &value);
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  MEANFIELD_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  MEANFIELD_DEBUG=all                               Enable debug for all crates

Examples:
  --debug-meanfield-engine
  MEANFIELD_DEBUG=meanfield-engine,meanfield-config
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-meanfield-engine".to_string()]);
        assert!(flags.is_enabled("meanfield-engine"));
        assert!(!flags.is_enabled("meanfield-config"));
        assert!(flags.any_enabled());
    }

    #[test]
    fn test_non_flag_arguments_are_ignored() {
        let flags = CrateDebugFlags::from_args(vec![
            "meanfield-run".to_string(),
            "--config".to_string(),
            "run.toml".to_string(),
        ]);
        assert!(!flags.any_enabled());
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_uses_targets() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-meanfield-engine".to_string(),
            "--debug-meanfield-config".to_string(),
        ]);
        assert_eq!(
            flags.to_filter_string(),
            "meanfield_config=debug,meanfield_engine=debug,info"
        );
    }

    #[test]
    fn test_base_level() {
        let flags = CrateDebugFlags::default().with_base_level("WARN");
        assert_eq!(flags.to_filter_string(), "warn");
    }

    #[test]
    fn test_debug_env_value() {
        let mut flags = CrateDebugFlags::default();
        apply_debug_env(&mut flags, "meanfield-engine, meanfield-neural,");
        assert!(flags.is_enabled("meanfield-engine"));
        assert!(flags.is_enabled("meanfield-neural"));
        assert_eq!(flags.enabled_crates().len(), 2);

        let mut flags = CrateDebugFlags::default();
        apply_debug_env(&mut flags, "all");
        assert_eq!(flags.enabled_crates().len(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-meanfield-engine".to_string()]);
        assert_eq!(flags.log_level("meanfield-engine"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("meanfield-neural"), tracing::Level::INFO);
    }
}
