// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Monitors
//!
//! - [`TemporalAverage`]: running means of (r, V) over `len / subwindows` steps
//! - [`BoldMonitor`]: per-node Balloon–Windkessel state and latest BOLD sample
//! - [`TraceRecorder`]: append-only full-horizon traces of both

use meanfield_neural::{BalloonState, STATE_VARIABLES};
use ndarray::{Array2, Array3};

/// Per-window temporal-average accumulator, `(subwindows, 2, nodes)`
#[derive(Debug, Clone)]
pub struct TemporalAverage {
    data: Vec<f32>,
    subwindows: usize,
    nodes: usize,
    steps_per_subwindow: usize,
    weight: f32,
}

impl TemporalAverage {
    pub fn new(history_length: usize, subwindows: usize, nodes: usize) -> Self {
        Self {
            data: vec![0.0; subwindows * STATE_VARIABLES * nodes],
            subwindows,
            nodes,
            steps_per_subwindow: history_length / subwindows,
            weight: (1.0 / history_length as f64 * subwindows as f64) as f32,
        }
    }

    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|x| *x = 0.0);
    }

    /// Sub-window that the step reading slot `t` contributes to
    #[inline(always)]
    pub fn subwindow_of(&self, t: usize) -> usize {
        t / self.steps_per_subwindow
    }

    #[inline(always)]
    pub fn accumulate(&mut self, subwindow: usize, node: usize, rate: f32, potential: f32) {
        let base = subwindow * STATE_VARIABLES * self.nodes;
        self.data[base + node] += rate * self.weight;
        self.data[base + self.nodes + node] += potential * self.weight;
    }

    /// Current (possibly partial) average rate of sub-window 0
    #[inline(always)]
    pub fn first_rate(&self, node: usize) -> f32 {
        self.data[node]
    }

    pub fn get(&self, subwindow: usize, variable: usize, node: usize) -> f32 {
        self.data[(subwindow * STATE_VARIABLES + variable) * self.nodes + node]
    }

    pub fn subwindows(&self) -> usize {
        self.subwindows
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Hemodynamic state and latest BOLD output per node
#[derive(Debug, Clone)]
pub struct BoldMonitor {
    states: Vec<BalloonState>,
    output: Vec<f32>,
}

impl BoldMonitor {
    pub fn new(nodes: usize) -> Self {
        Self {
            states: vec![BalloonState::RESTING; nodes],
            output: vec![0.0; nodes],
        }
    }

    /// Advance node `node` with neural drive `drive` and store its BOLD sample
    #[inline(always)]
    pub fn update(&mut self, node: usize, drive: f32, dt: f32) {
        self.output[node] = self.states[node].step(drive, dt);
    }

    pub fn output(&self) -> &[f32] {
        &self.output
    }

    pub fn states(&self) -> &[BalloonState] {
        &self.states
    }
}

/// Full-horizon tavg and BOLD traces
///
/// Pre-allocated for the planned horizon and grown only if a resumable run goes
/// past it. Rows of the BOLD trace never written stay zero.
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    tavg: Vec<f32>,
    bold: Vec<f32>,
    subwindows: usize,
    nodes: usize,
    bold_skip: usize,
    windows: usize,
}

impl TraceRecorder {
    pub fn new(planned_windows: usize, subwindows: usize, nodes: usize, bold_skip: usize) -> Self {
        let block = subwindows * STATE_VARIABLES * nodes;
        let bold_rows = planned_windows / bold_skip + 1;
        Self {
            tavg: vec![0.0; planned_windows * block],
            bold: vec![0.0; bold_rows * nodes],
            subwindows,
            nodes,
            bold_skip,
            windows: 0,
        }
    }

    /// Record the finished window; BOLD is sampled every `bold_skip` windows
    pub fn record_window(&mut self, tavg: &TemporalAverage, bold: &BoldMonitor) {
        let window = self.windows;
        let block = self.subwindows * STATE_VARIABLES * self.nodes;
        let start = window * block;
        if self.tavg.len() < start + block {
            self.tavg.resize(start + block, 0.0);
        }
        self.tavg[start..start + block].copy_from_slice(tavg.as_slice());

        if window % self.bold_skip == 0 {
            let row = window / self.bold_skip;
            let start = row * self.nodes;
            if self.bold.len() < start + self.nodes {
                self.bold.resize(start + self.nodes, 0.0);
            }
            self.bold[start..start + self.nodes].copy_from_slice(bold.output());
        }
        self.windows += 1;
    }

    pub fn windows(&self) -> usize {
        self.windows
    }

    /// Rows of the BOLD trace for the windows recorded so far
    pub fn bold_rows(&self) -> usize {
        self.windows / self.bold_skip + 1
    }

    /// tavg trace `(windows * subwindows, 2, nodes)` and BOLD trace `(bold_rows, nodes)`
    pub fn to_arrays(&self) -> (Array3<f32>, Array2<f32>) {
        let rows = self.windows * self.subwindows;
        let tavg_len = rows * STATE_VARIABLES * self.nodes;
        let tavg = Array3::from_shape_vec((rows, STATE_VARIABLES, self.nodes), self.tavg[..tavg_len].to_vec())
            .expect("tavg rows hold subwindows * 2 * nodes values per recorded window");

        let bold_rows = self.bold_rows();
        let mut bold_data = vec![0.0; bold_rows * self.nodes];
        let available = self.bold.len().min(bold_data.len());
        bold_data[..available].copy_from_slice(&self.bold[..available]);
        let bold = Array2::from_shape_vec((bold_rows, self.nodes), bold_data)
            .expect("bold buffer is sized bold_rows * nodes");
        (tavg, bold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_average_of_constant_is_constant() {
        let mut tavg = TemporalAverage::new(16, 4, 1);
        for t in 0..16 {
            tavg.accumulate(tavg.subwindow_of(t), 0, 2.0, -1.0);
        }
        for sub in 0..4 {
            assert!((tavg.get(sub, 0, 0) - 2.0).abs() < 1e-6);
            assert!((tavg.get(sub, 1, 0) + 1.0).abs() < 1e-6);
        }
        tavg.reset();
        assert!(tavg.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_subwindow_mapping() {
        let tavg = TemporalAverage::new(256, 16, 1);
        assert_eq!(tavg.subwindow_of(0), 0);
        assert_eq!(tavg.subwindow_of(15), 0);
        assert_eq!(tavg.subwindow_of(16), 1);
        assert_eq!(tavg.subwindow_of(255), 15);
    }

    #[test]
    fn test_bold_monitor_starts_at_rest() {
        let bold = BoldMonitor::new(3);
        assert!(bold.states().iter().all(|s| *s == BalloonState::RESTING));
        assert_eq!(bold.output(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_recorder_bold_cadence() {
        let tavg = TemporalAverage::new(8, 2, 2);
        let bold = BoldMonitor::new(2);
        let mut recorder = TraceRecorder::new(10, 2, 2, 3);
        for _ in 0..10 {
            recorder.record_window(&tavg, &bold);
        }
        let (tavg_trace, bold_trace) = recorder.to_arrays();
        assert_eq!(tavg_trace.dim(), (20, 2, 2));
        assert_eq!(bold_trace.dim(), (10 / 3 + 1, 2));
    }

    #[test]
    fn test_recorder_grows_past_plan() {
        let mut tavg = TemporalAverage::new(4, 1, 1);
        let bold = BoldMonitor::new(1);
        let mut recorder = TraceRecorder::new(1, 1, 1, 1);
        for w in 0..3 {
            tavg.reset();
            for t in 0..4 {
                tavg.accumulate(tavg.subwindow_of(t), 0, w as f32, 0.0);
            }
            recorder.record_window(&tavg, &bold);
        }
        let (trace, bold_trace) = recorder.to_arrays();
        assert_eq!(trace.dim(), (3, 2, 1));
        assert!((trace[[2, 0, 0]] - 2.0).abs() < 1e-6);
        assert_eq!(bold_trace.dim(), (4, 1));
    }

    #[test]
    fn test_recorder_shapes_before_and_after_first_window() {
        let mut tavg = TemporalAverage::new(8, 2, 3);
        let mut bold = BoldMonitor::new(3);
        let mut recorder = TraceRecorder::new(5, 2, 3, 2);

        let (empty, first_row) = recorder.to_arrays();
        assert_eq!(empty.dim(), (0, 2, 3));
        assert_eq!(first_row.dim(), (1, 3));
        assert!(first_row.iter().all(|&x| x == 0.0));

        for t in 0..8 {
            tavg.accumulate(tavg.subwindow_of(t), 1, 1.0, -1.0);
        }
        bold.update(1, 1.0, 0.1);
        recorder.record_window(&tavg, &bold);

        let (trace, bold_trace) = recorder.to_arrays();
        assert_eq!(trace.dim(), (2, 2, 3));
        assert!((trace[[1, 0, 1]] - 1.0).abs() < 1e-6);
        assert!((trace[[0, 1, 1]] + 1.0).abs() < 1e-6);
        assert_eq!(bold_trace[[0, 1]].to_bits(), bold.output()[1].to_bits());
    }
}
