// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Simulation Driver
//!
//! [`Simulator`] owns every buffer of a run and advances it by arbitrary step
//! counts. The window pipeline is keyed on the absolute step count:
//!
//! ```text
//! in-window step k == 0      → redraw noise, reset temporal average
//! in-window step k == len    → append tavg block; every bold_skip windows a BOLD row
//! ```
//!
//! so a run advanced in chunks produces bit-identical traces to one advanced in
//! a single call. [`run_simulation`] is the whole-horizon convenience wrapper.

use crate::connectivity::Connectivity;
use crate::error::{EngineError, EngineResult};
use crate::history::{DiscreteDelays, HistoryBuffer};
use crate::initial::InitialConditions;
use crate::kernel::{integrate_steps, KernelInputs, KernelState};
use crate::monitors::{BoldMonitor, TemporalAverage, TraceRecorder};
use crate::noise::{NoiseBuffer, NoiseSource};
use crate::parameters::SimulationParameters;
use crate::proxy::{splice, ProxyInjection};
use meanfield_neural::{euler_stability_limit, CouplingKind, DifferenceCoupling, LinearCoupling, MontbrioModel};
use ndarray::{s, Array2, Array3};
use std::ops::Range;
use tracing::{debug, info, warn};

/// Temporal-average and BOLD traces of a run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    /// `(windows * subwindows, 2, nodes)`
    pub tavg: Array3<f32>,
    /// `(windows / bold_skip + 1, nodes)`
    pub bold: Array2<f32>,
}

/// Per-step states produced by one [`Simulator::advance`] call
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    /// Time of each row, `step * dt`
    pub times: Vec<f64>,
    /// `(steps, 2, nodes)`
    pub states: Array3<f32>,
}

/// Resumable delayed-coupling network simulation
#[derive(Debug, Clone)]
pub struct Simulator {
    params: SimulationParameters,
    model: MontbrioModel,
    weights: Vec<f32>,
    delays: DiscreteDelays,
    proxies: Vec<usize>,
    proxy_mask: Vec<bool>,
    min_proxy_delay: Option<u32>,
    history: HistoryBuffer,
    noise_source: NoiseSource,
    noise: NoiseBuffer,
    tavg: TemporalAverage,
    bold: BoldMonitor,
    recorder: TraceRecorder,
    steps_done: u64,
    planned_windows: usize,
}

impl Simulator {
    /// Validate the setup, discretize delays and fill the initial history
    ///
    /// # Errors
    /// Any configuration error; nothing is integrated when this fails.
    pub fn new(
        params: SimulationParameters,
        connectivity: &Connectivity,
        initial: &impl InitialConditions,
    ) -> EngineResult<Self> {
        params.validate()?;
        let nodes = connectivity.nodes();
        let len = params.history_length;

        let delays = DiscreteDelays::discretize(connectivity, params.dt, len)?;
        let weights = connectivity.weights().iter().map(|&w| w as f32).collect();

        let mut history = HistoryBuffer::new(len, nodes)?;
        let offsets = history.time_offsets(params.dt);
        initial.fill(&offsets, history.view_mut());

        if !params.bold_is_stable() {
            warn!(
                "[SIMULATOR] dt = {} is at or above the BOLD stability limit {:.3}; the BOLD trace will diverge to NaN",
                params.dt,
                euler_stability_limit()
            );
        }

        let planned_windows = params.total_windows();
        debug!(
            "[SIMULATOR] {} nodes, history {} steps, max delay {} steps, {} windows planned",
            nodes,
            len,
            delays.max(),
            planned_windows
        );

        Ok(Self {
            model: MontbrioModel::new(params.model),
            weights,
            delays,
            proxies: Vec::new(),
            proxy_mask: vec![false; nodes],
            min_proxy_delay: None,
            history,
            noise_source: NoiseSource::new(params.seed),
            noise: NoiseBuffer::new(len, nodes),
            tavg: TemporalAverage::new(len, params.tavg_subwindows, nodes),
            bold: BoldMonitor::new(nodes),
            recorder: TraceRecorder::new(planned_windows, params.tavg_subwindows, nodes, params.bold_skip()),
            steps_done: 0,
            planned_windows,
            params,
        })
    }

    /// Mark `proxies` as externally supplied nodes
    pub fn with_proxies(mut self, proxies: &[usize]) -> EngineResult<Self> {
        let nodes = self.nodes();
        let mut mask = vec![false; nodes];
        for &node in proxies {
            if node >= nodes {
                return Err(EngineError::ProxyNodeOutOfRange { node, nodes });
            }
            mask[node] = true;
        }

        // shortest delay on any edge from a proxy into a locally integrated node
        self.min_proxy_delay = (0..nodes)
            .filter(|&to| !mask[to])
            .flat_map(|to| proxies.iter().map(move |&from| (to, from)))
            .map(|(to, from)| self.delays.get(to, from))
            .min();
        self.proxies = proxies.to_vec();
        self.proxy_mask = mask;
        Ok(self)
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn nodes(&self) -> usize {
        self.proxy_mask.len()
    }

    pub fn proxies(&self) -> &[usize] {
        &self.proxies
    }

    /// Steps integrated so far
    pub fn steps_done(&self) -> u64 {
        self.steps_done
    }

    /// Simulated time so far
    pub fn time(&self) -> f64 {
        self.steps_done as f64 * self.params.dt
    }

    /// Windows completed and recorded so far
    pub fn windows_done(&self) -> usize {
        self.recorder.windows()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Advance by `steps`, after splicing `injection` into the proxy history
    ///
    /// Returns the state of every node after each step.
    pub fn advance(&mut self, steps: u64, injection: Option<&ProxyInjection>) -> EngineResult<RawChunk> {
        if let Some(injection) = injection {
            splice(&mut self.history, &self.proxies, injection, self.params.dt, self.steps_done)?;
        }
        if let Some(min_delay) = self.min_proxy_delay {
            if steps > min_delay as u64 {
                warn!(
                    "[SIMULATOR] Advancing {} steps but the shortest proxy delay is {} steps; local nodes will read proxy history that was not injected",
                    steps, min_delay
                );
            }
        }

        let rows = steps as usize;
        let first = self.steps_done;
        let times = (1..=steps).map(|s| (first + s) as f64 * self.params.dt).collect();
        let mut states = Array3::zeros((rows, 2, self.nodes()));
        self.step(steps, Some(&mut states));
        Ok(RawChunk { times, states })
    }

    /// Run to the end of the planned horizon and return the traces
    pub fn run(&mut self) -> EngineResult<SimulationOutput> {
        let planned = (self.planned_windows * self.params.history_length) as u64;
        let remaining = planned.saturating_sub(self.steps_done);
        info!(
            "[SIMULATOR] Running {} windows ({} steps) over {} nodes",
            self.planned_windows.saturating_sub(self.windows_done()),
            remaining,
            self.nodes()
        );
        self.step(remaining, None);
        Ok(self.output())
    }

    /// Traces of every window completed so far
    pub fn output(&self) -> SimulationOutput {
        let (tavg, bold) = self.recorder.to_arrays();
        SimulationOutput { tavg, bold }
    }

    fn step(&mut self, steps: u64, mut raw: Option<&mut Array3<f32>>) {
        let len = self.params.history_length;
        let mut remaining = steps;
        let mut row = 0usize;

        while remaining > 0 {
            let k = (self.steps_done % len as u64) as usize;
            if k == 0 {
                self.noise.refill(&mut self.noise_source);
                self.tavg.reset();
            }
            let count = ((len - k) as u64).min(remaining) as usize;
            self.integrate(k..k + count);

            if let Some(states) = raw.as_deref_mut() {
                for slot in k..k + count {
                    states.slice_mut(s![row, .., ..]).assign(&self.history.slot(slot));
                    row += 1;
                }
            }

            self.steps_done += count as u64;
            remaining -= count as u64;
            if k + count == len {
                self.finish_window();
            }
        }
    }

    fn integrate(&mut self, range: Range<usize>) {
        let inputs = KernelInputs {
            model: &self.model,
            weights: &self.weights,
            delays: &self.delays,
            proxy_mask: &self.proxy_mask,
            dt: self.params.dt as f32,
            r_sigma: self.params.r_sigma,
            v_sigma: self.params.v_sigma,
        };
        let state = KernelState {
            history: &mut self.history,
            noise: &self.noise,
            tavg: &mut self.tavg,
            bold: &mut self.bold,
        };
        let scale = self.params.coupling_scale;
        match self.params.coupling {
            CouplingKind::Linear => integrate_steps(&inputs, LinearCoupling::new(scale), state, range),
            CouplingKind::Difference => integrate_steps(&inputs, DifferenceCoupling::new(scale), state, range),
        }
    }

    fn finish_window(&mut self) {
        self.recorder.record_window(&self.tavg, &self.bold);
        let windows = self.recorder.windows();

        if self.params.progress && self.planned_windows > 0 {
            let every = (self.planned_windows / 10).max(1);
            if windows % every == 0 || windows == self.planned_windows {
                info!(
                    "[SIMULATOR] Progress: {}/{} windows ({:.0}%)",
                    windows,
                    self.planned_windows,
                    100.0 * windows as f64 / self.planned_windows as f64
                );
            }
        }
    }
}

/// Run a whole simulation in one call
pub fn run_simulation(
    params: SimulationParameters,
    connectivity: &Connectivity,
    initial: &impl InitialConditions,
) -> EngineResult<SimulationOutput> {
    Simulator::new(params, connectivity, initial)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initial::ConstantInitialConditions;
    use ndarray::Array2;

    fn small_params() -> SimulationParameters {
        SimulationParameters {
            total_time: 64.0 * 10.0,
            bold_tr: 64.0 * 3.0,
            dt: 1.0,
            history_length: 64,
            tavg_subwindows: 4,
            ..Default::default()
        }
    }

    fn small_network() -> Connectivity {
        Connectivity::random(4, 20.0, 3).unwrap()
    }

    #[test]
    fn test_output_shapes() {
        let out = run_simulation(small_params(), &small_network(), &ConstantInitialConditions::default()).unwrap();
        assert_eq!(out.tavg.dim(), (10 * 4, 2, 4));
        assert_eq!(out.bold.dim(), (10 / 3 + 1, 4));
    }

    #[test]
    fn test_initial_history_is_filled() {
        let sim = Simulator::new(small_params(), &small_network(), &ConstantInitialConditions::default()).unwrap();
        assert_eq!(sim.steps_done(), 0);
        assert_eq!(sim.history().potential(63, 2), -2.0);
        assert_eq!(sim.history().rate(0, 0), 0.0);
    }

    #[test]
    fn test_raw_chunk_times_and_rows() {
        let mut sim = Simulator::new(small_params(), &small_network(), &ConstantInitialConditions::default()).unwrap();
        sim.advance(3, None).unwrap();
        let chunk = sim.advance(70, None).unwrap();
        assert_eq!(chunk.times.len(), 70);
        assert_eq!(chunk.times[0], 4.0);
        assert_eq!(chunk.times[69], 73.0);
        assert_eq!(chunk.states.dim(), (70, 2, 4));
        // last row is the state of step 73, which lives in slot 72 & 63 = 8
        let last = sim.history().slot(8);
        assert_eq!(chunk.states.slice(s![69, .., ..]), last);
        assert_eq!(sim.windows_done(), 1);
    }

    #[test]
    fn test_proxy_out_of_range() {
        let sim = Simulator::new(small_params(), &small_network(), &ConstantInitialConditions::default()).unwrap();
        assert_eq!(
            sim.with_proxies(&[4]).unwrap_err(),
            EngineError::ProxyNodeOutOfRange { node: 4, nodes: 4 }
        );
    }

    #[test]
    fn test_min_proxy_delay_ignores_proxy_targets() {
        let weights = Array2::ones((3, 3));
        let mut delays = Array2::from_elem((3, 3), 10.0);
        delays[[0, 2]] = 4.0; // proxy 2 -> local 0
        delays[[1, 2]] = 7.0; // proxy 2 -> proxy 1, not read locally
        delays[[0, 1]] = 6.0; // proxy 1 -> local 0
        let conn = Connectivity::new(weights, delays).unwrap();
        let sim = Simulator::new(small_params(), &conn, &ConstantInitialConditions::default())
            .unwrap()
            .with_proxies(&[1, 2])
            .unwrap();
        assert_eq!(sim.min_proxy_delay, Some(4));
        assert_eq!(sim.proxies(), &[1, 2]);
    }

    #[test]
    fn test_delay_exceeding_history_fails_before_stepping() {
        let conn = Connectivity::new(Array2::ones((2, 2)), Array2::from_elem((2, 2), 64.0)).unwrap();
        let result = Simulator::new(small_params(), &conn, &ConstantInitialConditions::default());
        assert!(matches!(result, Err(EngineError::DelayExceedsHistory { steps: 64, .. })));
    }
}
