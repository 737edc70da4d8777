// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Montbrió–Pazó–Roxin Firing-Rate Model
//!
//! Exact mean-field reduction of a population of quadratic integrate-and-fire
//! neurons with Lorentzian-distributed excitabilities.
//!
//! ## Model Dynamics
//!
//! ```text
//! dr/dt = (Δ/(π·τ) + 2·V·r) / τ
//! dV/dt = (V² - π²·τ²·r² + η + J·τ·r + I + c_r·r_c + c_v·V_c) / τ
//!
//!     Where:
//!     - r   = population firing rate (non-negative)
//!     - V   = mean membrane potential
//!     - r_c = delayed coupling computed over the rates of all other nodes
//!     - V_c = delayed coupling computed over their potentials
//! ```
//!
//! The coupling terms are held constant across the four Runge-Kutta stages.

use super::traits::ModelParameters;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of state variables per node (r, V)
pub const STATE_VARIABLES: usize = 2;

/// Montbrió model parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MontbrioParameters {
    /// External input current
    pub i_ext: f32,
    /// Half-width of the excitability distribution
    pub delta: f32,
    /// Mean excitability
    pub eta: f32,
    /// Membrane time constant
    pub tau: f32,
    /// Recurrent synaptic weight
    pub j: f32,
    /// Gain of the rate coupling term
    pub cr: f32,
    /// Gain of the potential coupling term
    pub cv: f32,
}

impl Default for MontbrioParameters {
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

impl ModelParameters for MontbrioParameters {
    fn validate(&self) -> Result<(), &'static str> {
        if !(self.tau.is_finite() && self.tau > 0.0) {
            return Err("Montbrio: tau must be finite and positive");
        }
        if !(self.delta.is_finite() && self.delta >= 0.0) {
            return Err("Montbrio: delta must be finite and non-negative");
        }
        let others = [self.i_ext, self.eta, self.j, self.cr, self.cv];
        if others.iter().any(|v| !v.is_finite()) {
            return Err("Montbrio: parameters must be finite");
        }
        Ok(())
    }
}

/// Montbrió model with per-run constants folded in
///
/// Built once per run so the hot loop only multiplies.
#[derive(Debug, Clone, Copy)]
pub struct MontbrioModel {
    params: MontbrioParameters,
    recip_tau: f32,
    rate_offset: f32,
    rate_quadratic: f32,
    rate_linear: f32,
    one_sixth: f32,
}

impl MontbrioModel {
    pub fn new(params: MontbrioParameters) -> Self {
        let pi = core::f32::consts::PI;
        let tau = params.tau;
        Self {
            params,
            recip_tau: 1.0 / tau,
            rate_offset: params.delta / (pi * tau),
            rate_quadratic: (pi * pi) * (tau * tau),
            rate_linear: params.j * tau,
            one_sixth: 1.0 / 6.0,
        }
    }

    pub fn params(&self) -> &MontbrioParameters {
        &self.params
    }

    /// Firing-rate derivative
    #[inline(always)]
    pub fn dr(&self, r: f32, v: f32) -> f32 {
        self.recip_tau * (self.rate_offset + 2.0 * v * r)
    }

    /// Membrane-potential derivative with coupling inputs `rc`, `vc`
    #[inline(always)]
    pub fn dv(&self, r: f32, v: f32, rc: f32, vc: f32) -> f32 {
        let p = &self.params;
        self.recip_tau
            * (v * v - self.rate_quadratic * (r * r)
                + p.eta
                + self.rate_linear * r
                + p.i_ext
                + p.cr * rc
                + p.cv * vc)
    }

    /// One classical RK4 step of the deterministic dynamics
    ///
    /// Returns `(r, V)` after `dt`. No noise and no clamping; both belong to the caller.
    #[inline(always)]
    pub fn rk4_step(&self, r: f32, v: f32, rc: f32, vc: f32, dt: f32) -> (f32, f32) {
        let half = dt * 0.5;

        let dr_0 = self.dr(r, v);
        let dv_0 = self.dv(r, v, rc, vc);

        let (r_1, v_1) = (r + half * dr_0, v + half * dv_0);
        let dr_1 = self.dr(r_1, v_1);
        let dv_1 = self.dv(r_1, v_1, rc, vc);

        let (r_2, v_2) = (r + half * dr_1, v + half * dv_1);
        let dr_2 = self.dr(r_2, v_2);
        let dv_2 = self.dv(r_2, v_2, rc, vc);

        let (r_3, v_3) = (r + dt * dr_2, v + dt * dv_2);
        let dr_3 = self.dr(r_3, v_3);
        let dv_3 = self.dv(r_3, v_3, rc, vc);

        let scale = self.one_sixth * dt;
        (
            r + scale * (dr_0 + 2.0 * (dr_1 + dr_2) + dr_3),
            v + scale * (dv_0 + 2.0 * (dv_1 + dv_2) + dv_3),
        )
    }
}
