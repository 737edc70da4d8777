// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Turning a loaded [`MeanfieldConfig`] into engine objects
//!
//! The config crate only knows plain values; this module builds run
//! parameters, the network, initial conditions, the sweep grid and the
//! logging options from them.

use std::path::{Path, PathBuf};

use meanfield_config::{ConnectivityConfig, InitialConfig, LoggingConfig, MeanfieldConfig};
use meanfield_engine::{
    Connectivity, ConstantInitialConditions, EngineError, ParameterSweep, SimulationParameters,
};
use meanfield_neural::{CouplingKind, MontbrioParameters};
use meanfield_observability::{LogFormat, LoggingOptions};
use ndarray::Array2;
use tracing::{debug, info};

/// Result type for setup operations
pub type SetupResult<T> = Result<T, SetupError>;

/// Errors raised while building a run from configuration
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Unknown coupling kind '{0}' (expected 'linear' or 'difference')")]
    UnknownCoupling(String),

    #[error("Failed to read matrix file {path}: {source}")]
    MatrixIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse matrix file {path}: {source}")]
    MatrixParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Matrix file {path} is not rectangular: {reason}")]
    RaggedMatrix { path: PathBuf, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Run parameters for a single simulation
pub fn parameters_from_config(config: &MeanfieldConfig) -> SetupResult<SimulationParameters> {
    let coupling = CouplingKind::from_name(&config.coupling.kind)
        .ok_or_else(|| SetupError::UnknownCoupling(config.coupling.kind.clone()))?;

    let model = &config.model;
    Ok(SimulationParameters {
        total_time: config.integration.total_time,
        bold_tr: config.monitors.bold_tr,
        dt: config.integration.dt,
        history_length: config.integration.history_length,
        tavg_subwindows: config.integration.tavg_subwindows,
        coupling,
        coupling_scale: config.coupling.scale,
        r_sigma: config.noise.r_sigma,
        v_sigma: config.noise.v_sigma,
        model: MontbrioParameters {
            i_ext: model.i_ext,
            delta: model.delta,
            eta: model.eta,
            tau: model.tau,
            j: model.j,
            cr: model.cr,
            cv: model.cv,
        },
        seed: config.integration.seed,
        progress: config.integration.progress,
    })
}

/// Load the weight and delay matrices, or draw a seeded random network
pub fn connectivity_from_config(config: &ConnectivityConfig) -> SetupResult<Connectivity> {
    match (&config.weights_path, &config.delays_path) {
        (Some(weights_path), Some(delays_path)) => {
            let weights = read_matrix(weights_path)?;
            let delays = read_matrix(delays_path)?;
            info!(
                "[SETUP] Loaded {}x{} network from {}",
                weights.nrows(),
                weights.ncols(),
                weights_path.display()
            );
            Ok(Connectivity::new(weights, delays)?)
        }
        _ => {
            debug!(
                "[SETUP] Drawing random {}-node network (max delay {}, seed {})",
                config.nodes, config.max_delay, config.seed
            );
            Ok(Connectivity::random(config.nodes, config.max_delay, config.seed)?)
        }
    }
}

/// Read a square-or-not matrix stored as a JSON array of rows
///
/// Shape checks against the other matrix are left to [`Connectivity::new`].
pub fn read_matrix(path: &Path) -> SetupResult<Array2<f64>> {
    let contents = std::fs::read_to_string(path).map_err(|source| SetupError::MatrixIo {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<Vec<f64>> =
        serde_json::from_str(&contents).map_err(|source| SetupError::MatrixParse {
            path: path.to_path_buf(),
            source,
        })?;

    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != ncols) {
        return Err(SetupError::RaggedMatrix {
            path: path.to_path_buf(),
            reason: format!("row {} has {} entries, row 0 has {}", index, row.len(), ncols),
        });
    }

    let data: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), data).map_err(|e| SetupError::RaggedMatrix {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn initial_from_config(config: &InitialConfig) -> ConstantInitialConditions {
    ConstantInitialConditions {
        r: config.r,
        v: config.v,
    }
}

/// Sweep grid over `base`, `None` when no axes are configured
pub fn sweep_from_config(
    config: &MeanfieldConfig,
    base: SimulationParameters,
) -> SetupResult<Option<ParameterSweep>> {
    if config.sweep.axes.is_empty() {
        return Ok(None);
    }
    let sweep = config
        .sweep
        .axes
        .iter()
        .try_fold(ParameterSweep::new(base), |sweep, axis| {
            sweep.axis(&axis.name, axis.values.clone())
        })?
        .n_jobs(config.sweep.n_jobs);
    Ok(Some(sweep))
}

pub fn logging_options(config: &LoggingConfig) -> LoggingOptions {
    LoggingOptions {
        level: config.level.clone(),
        console_format: LogFormat::Text,
        log_dir: config.log_dir.clone(),
        file_logging: config.file_logging,
        retention_runs: config.keep_runs,
    }
}
