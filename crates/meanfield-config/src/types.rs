// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `meanfield_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MeanfieldConfig {
    pub integration: IntegrationConfig,
    pub model: ModelConfig,
    pub coupling: CouplingConfig,
    pub noise: NoiseConfig,
    pub monitors: MonitorsConfig,
    pub connectivity: ConnectivityConfig,
    pub initial: InitialConfig,
    pub sweep: SweepConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Solver and horizon settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub dt: f64,
    pub total_time: f64,
    /// Ring-buffer length in steps, power of two, longer than every delay
    pub history_length: usize,
    pub tavg_subwindows: usize,
    pub seed: u64,
    pub progress: bool,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            dt: 1.0,
            total_time: 60e3,
            history_length: 256,
            tavg_subwindows: 16,
            seed: 42,
            progress: false,
        }
    }
}

/// Montbrió model parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub i_ext: f32,
    pub delta: f32,
    pub eta: f32,
    pub tau: f32,
    pub j: f32,
    pub cr: f32,
    pub cv: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            i_ext: 1.0,
            delta: 1.0,
            eta: -5.0,
            tau: 100.0,
            j: 15.0,
            cr: 0.01,
            cv: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CouplingConfig {
    /// "linear" or "difference"
    pub kind: String,
    pub scale: f32,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            kind: "linear".to_string(),
            scale: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub r_sigma: f32,
    pub v_sigma: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            r_sigma: 1e-3,
            v_sigma: 1e-3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorsConfig {
    /// BOLD sampling period, at least one history window
    pub bold_tr: f64,
}

impl Default for MonitorsConfig {
    fn default() -> Self {
        Self { bold_tr: 1800.0 }
    }
}

/// Network source: JSON matrix files, or a seeded random network
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Node count of the random network (ignored when matrices are loaded)
    pub nodes: usize,
    pub weights_path: Option<PathBuf>,
    pub delays_path: Option<PathBuf>,
    /// Upper bound of random delays
    pub max_delay: f64,
    pub seed: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            nodes: 96,
            weights_path: None,
            delays_path: None,
            max_delay: 25.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InitialConfig {
    pub r: f32,
    pub v: f32,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self { r: 0.0, v: -2.0 }
    }
}

/// One sweep axis, e.g. `{ name = "cr", values = [0.0, 0.05, 0.1] }`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SweepAxisConfig {
    pub name: String,
    pub values: Vec<f64>,
}

/// Parameter sweep; no axes means a single run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Worker threads, 0 = one per core
    pub n_jobs: usize,
    /// Axes in order, the first varies slowest
    pub axes: Vec<SweepAxisConfig>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            n_jobs: 1,
            axes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON file for the traces; stdout summary only when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    pub file_logging: bool,
    /// Run folders kept in `log_dir`
    pub keep_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            keep_runs: 10,
        }
    }
}
