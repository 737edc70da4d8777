// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Initial history of (r, V) before the first step

use ndarray::{ArrayViewMut3, Axis};
use serde::{Deserialize, Serialize};

/// Fills the whole history ring before integration starts
///
/// `history` is the `(2, len, nodes)` ring, variable 0 = r, variable 1 = V.
///
/// # Time offsets
///
/// `time_offsets[k] = -(len - 1 - k) * dt`. The first step reads slot
/// `len - 1`, so that slot is the state at time 0 and the slots before it step
/// back into the past:
///
/// ```text
/// slot          0                1           ...   len - 2   len - 1
/// time   -(len - 1)·dt   -(len - 2)·dt       ...     -dt        0
/// ```
///
/// This is not the `slot k -> -k·dt` layout of a plain "most recent first"
/// array: slot 0 is the oldest sample, not the newest. A delay of `d` steps
/// seen from the first step lands on slot `len - 1 - d`, time `-d·dt`.
pub trait InitialConditions {
    fn fill(&self, time_offsets: &[f64], history: ArrayViewMut3<'_, f32>);
}

/// Same (r, V) for every slot and node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantInitialConditions {
    pub r: f32,
    pub v: f32,
}

impl Default for ConstantInitialConditions {
    fn default() -> Self {
        Self { r: 0.0, v: -2.0 }
    }
}

impl InitialConditions for ConstantInitialConditions {
    fn fill(&self, _time_offsets: &[f64], mut history: ArrayViewMut3<'_, f32>) {
        history.index_axis_mut(Axis(0), 0).fill(self.r);
        history.index_axis_mut(Axis(0), 1).fill(self.v);
    }
}

impl<F> InitialConditions for F
where
    F: Fn(&[f64], ArrayViewMut3<'_, f32>),
{
    fn fill(&self, time_offsets: &[f64], history: ArrayViewMut3<'_, f32>) {
        self(time_offsets, history)
    }
}
