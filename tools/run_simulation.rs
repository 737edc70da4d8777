// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command-line runner.
//!
//! Loads `meanfield_configuration.toml` (or the file given with `--config`),
//! applies `--set key=value` overrides, then runs a single simulation or the
//! configured parameter sweep and writes the traces as JSON.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use meanfield::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config, parse_overrides,
    validate_config, ConfigError, MeanfieldConfig,
};
use meanfield::engine::run_simulation;
use meanfield::observability::{debug_flags_help, init_logging, parse_debug_flags};
use meanfield::{
    connectivity_from_config, initial_from_config, logging_options, parameters_from_config,
    sweep_from_config, OutputFile,
};
use tracing::{info, warn};

/// meanfield - delayed-coupling neural-mass network simulator
#[derive(Parser, Debug)]
#[command(name = "meanfield-run", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Configuration file (default: $MEANFIELD_CONFIG_PATH, then
    /// meanfield_configuration.toml in the current directory or a parent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override one configuration key, e.g. `--set eta=-4.5` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Write traces as JSON here instead of [output].path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Parse the command line; `--debug-*` flags belong to the logging setup
fn parse_args<I>(args: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = String>,
{
    Args::try_parse_from(args.into_iter().filter(|arg| !arg.starts_with("--debug-")))
}

/// Load the configuration, falling back to defaults when no file exists
fn resolve_config(
    path: Option<&Path>,
    overrides: &HashMap<String, String>,
) -> Result<(MeanfieldConfig, Option<PathBuf>)> {
    if let Some(path) = path {
        let config = load_config(Some(path), Some(overrides))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        return Ok((config, Some(path.to_path_buf())));
    }

    match find_config_file() {
        Ok(found) => {
            let config = load_config(Some(&found), Some(overrides))
                .with_context(|| format!("Failed to load configuration from {}", found.display()))?;
            Ok((config, Some(found)))
        }
        Err(ConfigError::FileNotFound(_)) if env::var_os("MEANFIELD_CONFIG_PATH").is_none() => {
            let mut config = MeanfieldConfig::default();
            apply_environment_overrides(&mut config)?;
            apply_cli_overrides(&mut config, overrides)?;
            Ok((config, None))
        }
        Err(e) => Err(e.into()),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = parse_args(env::args()).unwrap_or_else(|e| e.exit());
    let overrides = parse_overrides(args.overrides.as_slice())?;
    let (mut config, source) = resolve_config(args.config.as_deref(), &overrides)?;
    if let Some(output) = args.output {
        config.output.path = Some(output);
    }
    validate_config(&config)?;

    let debug_flags = parse_debug_flags();
    let _guard = init_logging(&debug_flags, &logging_options(&config.logging))?;
    match &source {
        Some(path) => info!("[RUN] Configuration loaded from {}", path.display()),
        None => warn!("[RUN] No configuration file found, using built-in defaults"),
    }

    let params = parameters_from_config(&config)?;
    let connectivity = connectivity_from_config(&config.connectivity)?;
    let initial = initial_from_config(&config.initial);
    info!(
        "[RUN] {} nodes (max delay {}), {} windows of {} steps (dt = {})",
        connectivity.nodes(),
        connectivity.max_delay(),
        params.total_windows(),
        params.history_length,
        params.dt
    );

    let started = Instant::now();
    let output = match sweep_from_config(&config, params)? {
        Some(sweep) => {
            let result = sweep.run(&connectivity, &initial)?;
            OutputFile::sweep(&result)
        }
        None => {
            let result = run_simulation(params, &connectivity, &initial)?;
            OutputFile::single(&result)
        }
    };
    info!(
        "[RUN] {} run(s) finished in {:.2}s",
        output.runs.len(),
        started.elapsed().as_secs_f64()
    );

    match &config.output.path {
        Some(path) => {
            output.write(path)?;
            info!("[RUN] Traces written to {}", path.display());
        }
        None => {
            for (index, run) in output.runs.iter().enumerate() {
                println!(
                    "run {index}: parameters {:?}, tavg shape {:?}, bold shape {:?}",
                    run.parameters, run.tavg.shape, run.bold.shape
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &[&str]) -> Vec<String> {
        line.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_options_are_parsed() {
        let parsed = parse_args(args(&[
            "meanfield-run",
            "--config",
            "run.toml",
            "--set",
            "eta=-4.5",
            "--set",
            "nodes=16",
            "-o",
            "traces.json",
        ]))
        .unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("run.toml")));
        assert_eq!(parsed.overrides, vec!["eta=-4.5", "nodes=16"]);
        assert_eq!(parsed.output, Some(PathBuf::from("traces.json")));
    }

    #[test]
    fn test_debug_flags_pass_through_in_any_position() {
        let line = args(&["meanfield-run", "--debug-meanfield-engine", "--set", "dt=0.1", "--debug-all"]);
        let parsed = parse_args(line.clone()).unwrap();
        assert_eq!(parsed.overrides, vec!["dt=0.1"]);
        assert!(parsed.config.is_none());

        let flags = meanfield::observability::CrateDebugFlags::from_args(line);
        assert!(flags.is_enabled("meanfield-engine"));
        assert!(flags.is_enabled("meanfield-config"));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        assert!(parse_args(args(&["meanfield-run", "--verbose"])).is_err());
        assert!(parse_args(args(&["meanfield-run", "--set"])).is_err());
    }
}
