// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Circular State History
//!
//! Fixed-capacity ring of the last `len` steps of (r, V) for every node, stored as
//! one `(2, len, nodes)` array. `len` is a power of two so every wrap is a mask:
//!
//! ```text
//! slot(t - d) = (t + len - d) & (len - 1)
//! ```
//!
//! Absolute step `s` (the state after `s` integration steps) lives in slot
//! `(s - 1) & (len - 1)`; the initial condition (s = 0) therefore occupies the last
//! slot, which is exactly the slot the first step of a window reads.

use crate::connectivity::Connectivity;
use crate::error::{EngineError, EngineResult};
use meanfield_neural::STATE_VARIABLES;
use ndarray::{Array3, ArrayView2, ArrayViewMut3, Axis};

/// Slot `delay` steps before slot `t` in a ring of `len` slots (`len` a power of two)
#[inline(always)]
pub(crate) fn delayed_slot(t: usize, delay: u32, len: usize) -> usize {
    (t + len - delay as usize) & (len - 1)
}

/// Ring buffer of (r, V) history
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    data: Array3<f32>,
    len: usize,
    mask: usize,
    nodes: usize,
}

impl HistoryBuffer {
    /// Allocate a zeroed ring of `len` steps for `nodes` nodes
    ///
    /// # Errors
    /// `len` must be a non-zero power of two.
    pub fn new(len: usize, nodes: usize) -> EngineResult<Self> {
        if len == 0 || !len.is_power_of_two() {
            return Err(EngineError::HistoryNotPowerOfTwo(len));
        }
        Ok(Self {
            data: Array3::zeros((STATE_VARIABLES, len, nodes)),
            len,
            mask: len - 1,
            nodes,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn mask(&self) -> usize {
        self.mask
    }

    /// Slot holding the state `delay` steps before slot `t`
    #[inline(always)]
    pub fn delayed_slot(&self, t: usize, delay: u32) -> usize {
        delayed_slot(t, delay, self.len)
    }

    /// Slot holding absolute step `step`
    #[inline(always)]
    pub fn slot_of_step(&self, step: u64) -> usize {
        (step as usize).wrapping_add(self.mask) & self.mask
    }

    /// Time offset of every slot relative to the initial condition at slot `len - 1`
    pub fn time_offsets(&self, dt: f64) -> Vec<f64> {
        (0..self.len)
            .map(|slot| -((self.len - 1 - slot) as f64) * dt)
            .collect()
    }

    #[inline(always)]
    pub fn rate(&self, slot: usize, node: usize) -> f32 {
        self.data[[0, slot, node]]
    }

    #[inline(always)]
    pub fn potential(&self, slot: usize, node: usize) -> f32 {
        self.data[[1, slot, node]]
    }

    pub fn set(&mut self, slot: usize, node: usize, rate: f32, potential: f32) {
        self.data[[0, slot, node]] = rate;
        self.data[[1, slot, node]] = potential;
    }

    /// (2, nodes) view of one slot
    pub fn slot(&self, slot: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(1), slot)
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn view_mut(&mut self) -> ArrayViewMut3<'_, f32> {
        self.data.view_mut()
    }

    /// Contiguous rate and potential planes, each `len * nodes` in slot-major order
    #[inline]
    pub(crate) fn planes_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        let plane = self.len * self.nodes;
        let flat = self
            .data
            .as_slice_mut()
            .expect("history buffer is allocated in standard layout");
        flat.split_at_mut(plane)
    }
}

/// Delay matrix discretized to integer steps, row-major `[i * nodes + j]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscreteDelays {
    steps: Vec<u32>,
    nodes: usize,
    max: u32,
}

impl DiscreteDelays {
    /// Truncate `delays / dt` to steps and check each entry against the history length
    ///
    /// # Errors
    /// `EngineError::DelayExceedsHistory` for the first entry with `steps >= history_length`.
    pub fn discretize(connectivity: &Connectivity, dt: f64, history_length: usize) -> EngineResult<Self> {
        let nodes = connectivity.nodes();
        let mut steps = Vec::with_capacity(nodes * nodes);
        let mut max = 0u32;
        for ((to, from), &delay) in connectivity.delays().indexed_iter() {
            let d = (delay / dt) as u64;
            if d >= history_length as u64 {
                return Err(EngineError::DelayExceedsHistory {
                    from,
                    to,
                    steps: d,
                    history_length,
                });
            }
            let d = d as u32;
            max = max.max(d);
            steps.push(d);
        }
        Ok(Self { steps, nodes, max })
    }

    #[inline(always)]
    pub fn get(&self, to: usize, from: usize) -> u32 {
        self.steps[to * self.nodes + from]
    }

    /// Incoming delays of node `to`, indexed by source
    #[inline(always)]
    pub fn row(&self, to: usize) -> &[u32] {
        &self.steps[to * self.nodes..(to + 1) * self.nodes]
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }
}
