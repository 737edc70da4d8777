// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that values are within valid ranges and consistent with each other
//! before any simulation state is allocated. All problems are collected and
//! reported together.

use crate::{ConfigError, ConfigResult, MeanfieldConfig};

/// Parameter names accepted as sweep axes
pub const KNOWN_SWEEP_PARAMETERS: [&str; 12] = [
    "cr",
    "cv",
    "eta",
    "j",
    "delta",
    "tau",
    "i_ext",
    "coupling_scale",
    "r_sigma",
    "v_sigma",
    "bold_tr",
    "seed",
];

const COUPLING_KINDS: [&str; 3] = ["linear", "difference", "diff"];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    Inconsistent { fields: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::Inconsistent { fields, reason } => {
                write!(f, "Inconsistent configuration ({}): {}", fields, reason)
            }
        }
    }
}

fn invalid(errors: &mut Vec<ConfigValidationError>, field: &str, reason: &str) {
    errors.push(ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    });
}

/// Validate the complete configuration
///
/// Checks for:
/// - Solver settings (positive dt, power-of-two history, dividing sub-windows)
/// - Model parameter ranges
/// - BOLD period of at least one history window
/// - A usable network source whose delays fit in the history
/// - Known coupling kinds, sweep axes and log levels
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &MeanfieldConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_integration(config, &mut errors);
    validate_model(config, &mut errors);
    validate_monitors(config, &mut errors);
    validate_connectivity(config, &mut errors);
    validate_sweep(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_integration(config: &MeanfieldConfig, errors: &mut Vec<ConfigValidationError>) {
    let integration = &config.integration;

    if !(integration.dt.is_finite() && integration.dt > 0.0) {
        invalid(errors, "integration.dt", "must be finite and positive");
    }
    if !(integration.total_time.is_finite() && integration.total_time >= 0.0) {
        invalid(errors, "integration.total_time", "must be finite and non-negative");
    }
    if !integration.history_length.is_power_of_two() {
        invalid(errors, "integration.history_length", "must be a power of two");
    }
    if integration.tavg_subwindows == 0 || integration.history_length % integration.tavg_subwindows != 0 {
        errors.push(ConfigValidationError::Inconsistent {
            fields: "integration.tavg_subwindows, integration.history_length".to_string(),
            reason: format!(
                "{} sub-windows do not divide a history of {} steps",
                integration.tavg_subwindows, integration.history_length
            ),
        });
    }

    let noise = &config.noise;
    if !(noise.r_sigma.is_finite() && noise.r_sigma >= 0.0) {
        invalid(errors, "noise.r_sigma", "must be finite and non-negative");
    }
    if !(noise.v_sigma.is_finite() && noise.v_sigma >= 0.0) {
        invalid(errors, "noise.v_sigma", "must be finite and non-negative");
    }

    if !COUPLING_KINDS.contains(&config.coupling.kind.to_lowercase().as_str()) {
        invalid(errors, "coupling.kind", "must be 'linear' or 'difference'");
    }
    if !config.coupling.scale.is_finite() {
        invalid(errors, "coupling.scale", "must be finite");
    }
}

fn validate_model(config: &MeanfieldConfig, errors: &mut Vec<ConfigValidationError>) {
    let model = &config.model;

    if !(model.tau.is_finite() && model.tau > 0.0) {
        invalid(errors, "model.tau", "must be finite and positive");
    }
    if !(model.delta.is_finite() && model.delta >= 0.0) {
        invalid(errors, "model.delta", "must be finite and non-negative");
    }
    let others = [
        ("model.i_ext", model.i_ext),
        ("model.eta", model.eta),
        ("model.j", model.j),
        ("model.cr", model.cr),
        ("model.cv", model.cv),
    ];
    for (field, value) in others {
        if !value.is_finite() {
            invalid(errors, field, "must be finite");
        }
    }
}

fn validate_monitors(config: &MeanfieldConfig, errors: &mut Vec<ConfigValidationError>) {
    let window = config.integration.history_length as f64 * config.integration.dt;
    let bold_tr = config.monitors.bold_tr;
    if !bold_tr.is_finite() || !(window > 0.0) || bold_tr < window {
        errors.push(ConfigValidationError::Inconsistent {
            fields: "monitors.bold_tr, integration.history_length * integration.dt".to_string(),
            reason: format!("BOLD period {} is shorter than one window ({})", bold_tr, window),
        });
    }
}

fn validate_connectivity(config: &MeanfieldConfig, errors: &mut Vec<ConfigValidationError>) {
    let connectivity = &config.connectivity;

    match (&connectivity.weights_path, &connectivity.delays_path) {
        (Some(_), Some(_)) => {}
        (Some(_), None) => errors.push(ConfigValidationError::MissingRequired {
            field: "connectivity.delays_path".to_string(),
        }),
        (None, Some(_)) => errors.push(ConfigValidationError::MissingRequired {
            field: "connectivity.weights_path".to_string(),
        }),
        (None, None) => {
            if connectivity.nodes == 0 {
                invalid(errors, "connectivity.nodes", "must be at least 1");
            }
            if !(connectivity.max_delay.is_finite() && connectivity.max_delay >= 0.0) {
                invalid(errors, "connectivity.max_delay", "must be finite and non-negative");
            } else if config.integration.dt > 0.0
                && connectivity.max_delay / config.integration.dt > config.integration.history_length as f64
            {
                errors.push(ConfigValidationError::Inconsistent {
                    fields: "connectivity.max_delay, integration.history_length".to_string(),
                    reason: format!(
                        "delays up to {} need more than {} history steps at dt = {}",
                        connectivity.max_delay, config.integration.history_length, config.integration.dt
                    ),
                });
            }
        }
    }
}

fn validate_sweep(config: &MeanfieldConfig, errors: &mut Vec<ConfigValidationError>) {
    for (index, axis) in config.sweep.axes.iter().enumerate() {
        let field = format!("sweep.axes[{}]", index);
        if !KNOWN_SWEEP_PARAMETERS.contains(&axis.name.to_lowercase().as_str()) {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("{}.name", field),
                reason: format!("unknown sweep parameter '{}'", axis.name),
            });
        }
        if axis.values.is_empty() {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("{}.values", field),
                reason: "must contain at least one value".to_string(),
            });
        }
    }
}

fn validate_logging(config: &MeanfieldConfig, errors: &mut Vec<ConfigValidationError>) {
    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        invalid(errors, "logging.level", "must be one of trace, debug, info, warn, error");
    }
}
