// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Balloon–Windkessel Hemodynamic Model
//!
//! Converts a node's neural drive into a BOLD observable.
//!
//! ## Model Dynamics
//!
//! ```text
//! ds/dt = x - s/τ_s - (f - 1)/τ_f          vasodilatory signal
//! df/dt = s                                 inflow
//! dv/dt = (f - v^(1/α)) / τ_o               blood volume
//! dq/dt = (f·(1 - (1 - E0)^(1/f))/E0 - v^(1/α)·q/v) / τ_o   deoxyhemoglobin
//!
//! BOLD = V0 · (k1·(1 - q) + k2·(1 - q/v) + k3·(1 - v))
//! ```
//!
//! Integrated with explicit Euler. The caller owns step-size stability: `dt` must
//! stay below [`euler_stability_limit`], otherwise the state diverges to NaN.

/// Biophysical constants (compile-time, not run-time parameters)
pub mod constants {
    /// Signal decay time constant
    pub const TAU_S: f32 = 0.65;
    /// Autoregulatory feedback time constant
    pub const TAU_F: f32 = 0.41;
    /// Venous outflow (transit) time constant
    pub const TAU_O: f32 = 0.98;
    /// Grubb's exponent
    pub const ALPHA: f32 = 0.32;
    /// Echo time
    pub const TE: f32 = 0.04;
    /// Resting blood volume fraction (scaled)
    pub const V0: f32 = 4.0;
    /// Resting oxygen extraction fraction
    pub const E0: f32 = 0.4;
    /// Intra/extravascular signal ratio
    pub const EPSILON: f32 = 0.5;
    /// Frequency offset at the outer surface of magnetized vessels
    pub const NU_0: f32 = 40.3;
    /// Slope of intravascular relaxation rate
    pub const R_0: f32 = 25.0;

    pub const RECIP_TAU_S: f32 = 1.0 / TAU_S;
    pub const RECIP_TAU_F: f32 = 1.0 / TAU_F;
    pub const RECIP_TAU_O: f32 = 1.0 / TAU_O;
    pub const RECIP_ALPHA: f32 = 1.0 / ALPHA;
    pub const RECIP_E0: f32 = 1.0 / E0;

    pub const K1: f32 = 4.3 * NU_0 * E0 * TE;
    pub const K2: f32 = EPSILON * R_0 * E0 * TE;
    pub const K3: f32 = 1.0 - EPSILON;
}

use constants::*;

/// Largest `dt` for which the Euler step is stable around the resting state
///
/// Linearised at rest the (s, f) pair is a damped oscillator with trace
/// `-1/τ_s` and determinant `1/τ_f`, stable for `dt < τ_f / τ_s`. The volume
/// equation decays at `1/(α τ_o)` and needs `dt < 2 α τ_o`.
pub fn euler_stability_limit() -> f32 {
    (TAU_F / TAU_S).min(2.0 * ALPHA * TAU_O)
}

/// Hemodynamic state of one node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalloonState {
    /// Vasodilatory signal
    pub s: f32,
    /// Normalized inflow
    pub f: f32,
    /// Normalized blood volume
    pub v: f32,
    /// Normalized deoxyhemoglobin content
    pub q: f32,
}

impl BalloonState {
    /// Resting state: no signal, unit flow, volume and deoxyhemoglobin
    pub const RESTING: BalloonState = BalloonState {
        s: 0.0,
        f: 1.0,
        v: 1.0,
        q: 1.0,
    };

    pub fn new(s: f32, f: f32, v: f32, q: f32) -> Self {
        Self { s, f, v, q }
    }

    /// Advance one explicit-Euler step driven by `drive` and return the BOLD signal
    #[inline(always)]
    pub fn step(&mut self, drive: f32, dt: f32) -> f32 {
        let BalloonState { s, f, v, q } = *self;
        let v_alpha = v.powf(RECIP_ALPHA);

        let ds = drive - RECIP_TAU_S * s - RECIP_TAU_F * (f - 1.0);
        let df = s;
        let dv = RECIP_TAU_O * (f - v_alpha);
        let dq = RECIP_TAU_O * (f * (1.0 - (1.0 - E0).powf(1.0 / f)) * RECIP_E0 - v_alpha * (q / v));

        self.s = s + dt * ds;
        self.f = f + dt * df;
        self.v = v + dt * dv;
        self.q = q + dt * dq;

        self.bold()
    }

    /// BOLD observable of the current state
    #[inline(always)]
    pub fn bold(&self) -> f32 {
        V0 * (K1 * (1.0 - self.q) + K2 * (1.0 - self.q / self.v) + K3 * (1.0 - self.v))
    }
}

impl Default for BalloonState {
    fn default() -> Self {
        Self::RESTING
    }
}
