// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, MeanfieldConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "meanfield_configuration.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `MEANFIELD_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("MEANFIELD_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by MEANFIELD_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet MEANFIELD_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file is not found, contains invalid TOML, or an override
/// cannot be parsed. Semantic validation is separate: see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<MeanfieldConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: MeanfieldConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, value)))
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `MEANFIELD_DT` -> `integration.dt`
/// - `MEANFIELD_TOTAL_TIME` -> `integration.total_time`
/// - `MEANFIELD_SEED` -> `integration.seed`
/// - `MEANFIELD_LOG_LEVEL` -> `logging.level`
/// - `MEANFIELD_SWEEP_JOBS` -> `sweep.n_jobs`
/// - `MEANFIELD_OUTPUT_PATH` -> `output.path`
pub fn apply_environment_overrides(config: &mut MeanfieldConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("MEANFIELD_DT") {
        config.integration.dt = parse_value("MEANFIELD_DT", &value)?;
    }
    if let Ok(value) = env::var("MEANFIELD_TOTAL_TIME") {
        config.integration.total_time = parse_value("MEANFIELD_TOTAL_TIME", &value)?;
    }
    if let Ok(value) = env::var("MEANFIELD_SEED") {
        config.integration.seed = parse_value("MEANFIELD_SEED", &value)?;
    }
    if let Ok(value) = env::var("MEANFIELD_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("MEANFIELD_SWEEP_JOBS") {
        config.sweep.n_jobs = parse_value("MEANFIELD_SWEEP_JOBS", &value)?;
    }
    if let Ok(value) = env::var("MEANFIELD_OUTPUT_PATH") {
        config.output.path = Some(PathBuf::from(value));
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// Keys are the field names of the configuration sections (e.g. `dt`, `eta`,
/// `coupling_scale`, `bold_tr`, `nodes`). Fields whose name is ambiguous across
/// sections carry a prefix: `connectivity_seed`, `initial_r`, `initial_v`.
///
/// # Errors
///
/// `ConfigError::InvalidValue` for an unknown key or an unparsable value.
pub fn apply_cli_overrides(config: &mut MeanfieldConfig, cli_args: &HashMap<String, String>) -> ConfigResult<()> {
    for (key, value) in cli_args {
        let key = key.as_str();
        match key {
            // Integration
            "dt" => config.integration.dt = parse_value(key, value)?,
            "total_time" => config.integration.total_time = parse_value(key, value)?,
            "history_length" => config.integration.history_length = parse_value(key, value)?,
            "tavg_subwindows" => config.integration.tavg_subwindows = parse_value(key, value)?,
            "seed" => config.integration.seed = parse_value(key, value)?,
            "progress" => config.integration.progress = parse_bool(value),

            // Model
            "i_ext" => config.model.i_ext = parse_value(key, value)?,
            "delta" => config.model.delta = parse_value(key, value)?,
            "eta" => config.model.eta = parse_value(key, value)?,
            "tau" => config.model.tau = parse_value(key, value)?,
            "j" => config.model.j = parse_value(key, value)?,
            "cr" => config.model.cr = parse_value(key, value)?,
            "cv" => config.model.cv = parse_value(key, value)?,

            // Coupling, noise, monitors
            "coupling" => config.coupling.kind = value.clone(),
            "coupling_scale" => config.coupling.scale = parse_value(key, value)?,
            "r_sigma" => config.noise.r_sigma = parse_value(key, value)?,
            "v_sigma" => config.noise.v_sigma = parse_value(key, value)?,
            "bold_tr" => config.monitors.bold_tr = parse_value(key, value)?,

            // Connectivity
            "nodes" => config.connectivity.nodes = parse_value(key, value)?,
            "max_delay" => config.connectivity.max_delay = parse_value(key, value)?,
            "connectivity_seed" => config.connectivity.seed = parse_value(key, value)?,
            "weights_path" => config.connectivity.weights_path = Some(PathBuf::from(value)),
            "delays_path" => config.connectivity.delays_path = Some(PathBuf::from(value)),

            // Initial conditions
            "initial_r" => config.initial.r = parse_value(key, value)?,
            "initial_v" => config.initial.v = parse_value(key, value)?,

            // Sweep, output, logging
            "n_jobs" => config.sweep.n_jobs = parse_value(key, value)?,
            "output" => config.output.path = Some(PathBuf::from(value)),
            "log_level" => config.logging.level = value.clone(),
            "log_dir" => config.logging.log_dir = PathBuf::from(value),
            "file_logging" => config.logging.file_logging = parse_bool(value),

            _ => {
                return Err(ConfigError::InvalidValue(format!(
                    "unknown override key '{}'",
                    key
                )))
            }
        }
    }
    Ok(())
}

/// Split `key=value` strings into an override map
///
/// # Errors
///
/// `ConfigError::InvalidValue` for an entry without `=` or with an empty key.
pub fn parse_overrides<S: AsRef<str>>(pairs: &[S]) -> ConfigResult<HashMap<String, String>> {
    let mut overrides = HashMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                overrides.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => {
                return Err(ConfigError::InvalidValue(format!(
                    "override '{}' is not of the form key=value",
                    pair
                )))
            }
        }
    }
    Ok(overrides)
}
