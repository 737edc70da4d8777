// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Proxy Nodes
//!
//! A proxy node belongs to another partition of the network: this simulator does
//! not integrate it, it only carries its last value forward and lets callers
//! overwrite its recent history before each chunk of steps. As long as every
//! chunk is no longer than the shortest delay out of a proxy node, local nodes
//! only ever read proxy history that has already been injected.

use crate::error::{EngineError, EngineResult};
use crate::history::HistoryBuffer;
use ndarray::Array3;

/// Externally computed (r, V) of the proxy nodes for recent steps
///
/// `values` has shape `(times.len(), 2, proxies)`; column `p` belongs to the
/// `p`-th proxy node in the order the simulator was configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyInjection {
    pub times: Vec<f64>,
    pub values: Array3<f32>,
}

impl ProxyInjection {
    pub fn new(times: Vec<f64>, values: Array3<f32>) -> Self {
        Self { times, values }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Write `injection` into `history` for the proxy nodes `proxies`
///
/// Each time maps to step `round(time / dt)`, which must lie in the window of
/// steps still held by the ring: `current_step - len < step <= current_step`.
pub(crate) fn splice(
    history: &mut HistoryBuffer,
    proxies: &[usize],
    injection: &ProxyInjection,
    dt: f64,
    current_step: u64,
) -> EngineResult<()> {
    let expected = (injection.times.len(), 2, proxies.len());
    if injection.values.dim() != expected {
        return Err(EngineError::InjectionShape {
            expected,
            actual: injection.values.dim(),
        });
    }

    let oldest = current_step as i64 - history.len() as i64;
    let mut slots = Vec::with_capacity(injection.times.len());
    for &time in &injection.times {
        let step = (time / dt).round() as i64;
        if step <= oldest || step > current_step as i64 {
            return Err(EngineError::InjectionOutOfWindow {
                time,
                step,
                current_step,
            });
        }
        slots.push(history.slot_of_step(step as u64));
    }

    for (row, &slot) in slots.iter().enumerate() {
        for (column, &node) in proxies.iter().enumerate() {
            history.set(
                slot,
                node,
                injection.values[[row, 0, column]],
                injection.values[[row, 1, column]],
            );
        }
    }
    Ok(())
}
