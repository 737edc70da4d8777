// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Window Kernel
//!
//! The inner loop: delayed coupling, RK4, noise, clamping, temporal averaging and
//! the hemodynamic update for a contiguous range of in-window steps.
//!
//! In-window step `k` reads slot `t = (k - 1) mod len` and writes slot `k`, so the
//! first step of a window continues from the last slot written by the previous
//! window. Nodes are updated in ascending order, in place: a delay of exactly
//! `len - 1` resolves to slot `k` itself and therefore sees the new value of every
//! lower-indexed source node.
//!
//! The kernel is generic over [`CouplingFunction`] so `pre`/`post` inline into the
//! edge loop. Allocation-free; all buffers are owned by the caller.

use crate::history::{delayed_slot, DiscreteDelays, HistoryBuffer};
use crate::monitors::{BoldMonitor, TemporalAverage};
use crate::noise::NoiseBuffer;
use meanfield_neural::{CouplingFunction, MontbrioModel};
use std::ops::Range;

/// Read-only inputs shared by every step of a run
#[derive(Debug, Clone, Copy)]
pub(crate) struct KernelInputs<'a> {
    pub model: &'a MontbrioModel,
    /// Row-major `W[i * nodes + j]`
    pub weights: &'a [f32],
    pub delays: &'a DiscreteDelays,
    /// Nodes whose state is supplied externally and only carried forward here
    pub proxy_mask: &'a [bool],
    pub dt: f32,
    pub r_sigma: f32,
    pub v_sigma: f32,
}

/// Mutable per-run state the kernel advances
pub(crate) struct KernelState<'a> {
    pub history: &'a mut HistoryBuffer,
    pub noise: &'a NoiseBuffer,
    pub tavg: &'a mut TemporalAverage,
    pub bold: &'a mut BoldMonitor,
}

/// Integrate in-window steps `steps` (a sub-range of `0..len`)
pub(crate) fn integrate_steps<C: CouplingFunction>(
    inputs: &KernelInputs<'_>,
    coupling: C,
    state: KernelState<'_>,
    steps: Range<usize>,
) {
    let KernelState {
        history,
        noise,
        tavg,
        bold,
    } = state;

    let nodes = history.nodes();
    let len = history.len();
    let mask = history.mask();
    debug_assert!(steps.end <= len);
    debug_assert_eq!(inputs.weights.len(), nodes * nodes);
    debug_assert_eq!(inputs.proxy_mask.len(), nodes);

    let model = inputs.model;
    let dt = inputs.dt;
    let noise_r_scale = dt.sqrt() * inputs.r_sigma;
    let noise_v_scale = dt.sqrt() * inputs.v_sigma;

    let (noise_r, noise_v) = noise.planes();
    let (rates, potentials) = history.planes_mut();

    for k in steps {
        let t = (k + len - 1) & mask;
        let t1 = k;
        let subwindow = tavg.subwindow_of(t);
        let read = t * nodes;
        let write = t1 * nodes;

        for i in 0..nodes {
            let r_t = rates[read + i];
            let v_t = potentials[read + i];

            let (r_next, v_next) = if inputs.proxy_mask[i] {
                (r_t, v_t)
            } else {
                let weights = &inputs.weights[i * nodes..(i + 1) * nodes];
                let delays = inputs.delays.row(i);

                let mut rc = 0.0f32;
                let mut vc = 0.0f32;
                for j in 0..nodes {
                    let slot = delayed_slot(t, delays[j], len) * nodes + j;
                    rc += weights[j] * coupling.pre(rates[slot], r_t);
                    vc += weights[j] * coupling.pre(potentials[slot], v_t);
                }
                let rc = coupling.post(rc);
                let vc = coupling.post(vc);

                let (r, v) = model.rk4_step(r_t, v_t, rc, vc, dt);
                let r = r + noise_r_scale * noise_r[read + i];
                let v = v + noise_v_scale * noise_v[read + i];
                (if r >= 0.0 { r } else { 0.0 }, v)
            };

            rates[write + i] = r_next;
            potentials[write + i] = v_next;

            tavg.accumulate(subwindow, i, r_next, v_next);
            bold.update(i, tavg.first_rate(i), dt);
        }
    }
}
