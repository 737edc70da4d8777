// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run parameters of one simulation and the window arithmetic derived from them

use crate::error::{EngineError, EngineResult};
use meanfield_neural::{euler_stability_limit, CouplingKind, ModelParameters, MontbrioParameters};
use serde::{Deserialize, Serialize};

/// Everything the driver needs besides connectivity and initial conditions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Simulated horizon (same time unit as `dt` and the delays)
    pub total_time: f64,
    /// BOLD sampling period
    pub bold_tr: f64,
    /// Integration step
    pub dt: f64,
    /// Ring-buffer length in steps; one window = `history_length` steps
    pub history_length: usize,
    /// Temporal-average sub-windows per window
    pub tavg_subwindows: usize,
    pub coupling: CouplingKind,
    pub coupling_scale: f32,
    /// Noise intensity on the rate variable
    pub r_sigma: f32,
    /// Noise intensity on the potential variable
    pub v_sigma: f32,
    pub model: MontbrioParameters,
    pub seed: u64,
    /// Log progress roughly every tenth of the horizon
    pub progress: bool,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            total_time: 60e3,
            bold_tr: 1800.0,
            dt: 1.0,
            history_length: 256,
            tavg_subwindows: 16,
            coupling: CouplingKind::Linear,
            coupling_scale: 0.01,
            r_sigma: 1e-3,
            v_sigma: 1e-3,
            model: MontbrioParameters::default(),
            seed: 42,
            progress: false,
        }
    }
}

impl SimulationParameters {
    /// Duration of one history window
    pub fn window_duration(&self) -> f64 {
        self.history_length as f64 * self.dt
    }

    /// Number of whole windows that fit in the horizon
    pub fn total_windows(&self) -> usize {
        (self.total_time / self.window_duration()) as usize
    }

    /// Windows between consecutive BOLD samples
    pub fn bold_skip(&self) -> usize {
        (self.bold_tr / self.window_duration()) as usize
    }

    /// Rows of the BOLD trace for the full horizon
    pub fn bold_rows(&self) -> usize {
        self.total_windows() / self.bold_skip() + 1
    }

    /// Whether `dt` keeps the Euler-integrated BOLD model from diverging
    pub fn bold_is_stable(&self) -> bool {
        self.dt < f64::from(euler_stability_limit())
    }

    pub fn steps_per_subwindow(&self) -> usize {
        self.history_length / self.tavg_subwindows
    }

    /// Check everything that does not depend on the network
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "dt must be finite and positive, got {}",
                self.dt
            )));
        }
        if self.history_length == 0 || !self.history_length.is_power_of_two() {
            return Err(EngineError::HistoryNotPowerOfTwo(self.history_length));
        }
        if self.history_length > u32::MAX as usize {
            return Err(EngineError::InvalidParameter(format!(
                "history_length {} exceeds the delay index range",
                self.history_length
            )));
        }
        if self.tavg_subwindows == 0 || self.history_length % self.tavg_subwindows != 0 {
            return Err(EngineError::InvalidSubwindows {
                subwindows: self.tavg_subwindows,
                history_length: self.history_length,
            });
        }
        if !(self.total_time.is_finite() && self.total_time >= 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "total_time must be finite and non-negative, got {}",
                self.total_time
            )));
        }
        if !self.bold_tr.is_finite() || self.bold_skip() == 0 {
            return Err(EngineError::InvalidParameter(format!(
                "bold_tr {} is shorter than one window ({})",
                self.bold_tr,
                self.window_duration()
            )));
        }
        if !(self.r_sigma.is_finite() && self.r_sigma >= 0.0 && self.v_sigma.is_finite() && self.v_sigma >= 0.0)
        {
            return Err(EngineError::InvalidParameter(
                "noise intensities must be finite and non-negative".to_string(),
            ));
        }
        if !self.coupling_scale.is_finite() {
            return Err(EngineError::InvalidParameter(
                "coupling_scale must be finite".to_string(),
            ));
        }
        self.model
            .validate()
            .map_err(|reason| EngineError::InvalidParameter(reason.to_string()))?;
        Ok(())
    }
}
