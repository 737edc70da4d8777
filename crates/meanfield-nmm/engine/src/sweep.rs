// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Parameter Sweeps
//!
//! Runs the Cartesian product of named parameter axes, each combination as an
//! independent simulation over the same connectivity. The first axis varies
//! slowest. Combinations run on a bounded rayon pool when the `parallel` feature
//! is enabled and sequentially otherwise; results always come back in
//! combination order, and any failing combination fails the sweep.

use crate::connectivity::Connectivity;
use crate::error::{EngineError, EngineResult};
use crate::initial::InitialConditions;
use crate::parameters::SimulationParameters;
use crate::simulator::{run_simulation, SimulationOutput};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// A scalar run parameter that a sweep can vary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    Cr,
    Cv,
    Eta,
    J,
    Delta,
    Tau,
    IExt,
    CouplingScale,
    RSigma,
    VSigma,
    BoldTr,
    Seed,
}

impl SweepParameter {
    pub const ALL: [SweepParameter; 12] = [
        SweepParameter::Cr,
        SweepParameter::Cv,
        SweepParameter::Eta,
        SweepParameter::J,
        SweepParameter::Delta,
        SweepParameter::Tau,
        SweepParameter::IExt,
        SweepParameter::CouplingScale,
        SweepParameter::RSigma,
        SweepParameter::VSigma,
        SweepParameter::BoldTr,
        SweepParameter::Seed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SweepParameter::Cr => "cr",
            SweepParameter::Cv => "cv",
            SweepParameter::Eta => "eta",
            SweepParameter::J => "j",
            SweepParameter::Delta => "delta",
            SweepParameter::Tau => "tau",
            SweepParameter::IExt => "i_ext",
            SweepParameter::CouplingScale => "coupling_scale",
            SweepParameter::RSigma => "r_sigma",
            SweepParameter::VSigma => "v_sigma",
            SweepParameter::BoldTr => "bold_tr",
            SweepParameter::Seed => "seed",
        }
    }

    /// Set this parameter on `params`
    pub fn apply(&self, params: &mut SimulationParameters, value: f64) {
        match self {
            SweepParameter::Cr => params.model.cr = value as f32,
            SweepParameter::Cv => params.model.cv = value as f32,
            SweepParameter::Eta => params.model.eta = value as f32,
            SweepParameter::J => params.model.j = value as f32,
            SweepParameter::Delta => params.model.delta = value as f32,
            SweepParameter::Tau => params.model.tau = value as f32,
            SweepParameter::IExt => params.model.i_ext = value as f32,
            SweepParameter::CouplingScale => params.coupling_scale = value as f32,
            SweepParameter::RSigma => params.r_sigma = value as f32,
            SweepParameter::VSigma => params.v_sigma = value as f32,
            SweepParameter::BoldTr => params.bold_tr = value,
            SweepParameter::Seed => params.seed = value as u64,
        }
    }
}

impl std::fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SweepParameter {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let lowered = s.to_lowercase();
        match lowered.as_str() {
            "i" => Ok(SweepParameter::IExt),
            "v_sigma" | "vsigma" => Ok(SweepParameter::VSigma),
            "coupling_scaling" => Ok(SweepParameter::CouplingScale),
            other => SweepParameter::ALL
                .iter()
                .copied()
                .find(|p| p.name() == other)
                .ok_or_else(|| EngineError::UnknownSweepParameter(s.to_string())),
        }
    }
}

/// One point of the sweep grid and the run parameters it produces
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCombination {
    pub values: Vec<(SweepParameter, f64)>,
    pub params: SimulationParameters,
}

impl ParameterCombination {
    pub fn get(&self, parameter: SweepParameter) -> Option<f64> {
        self.values.iter().find(|(p, _)| *p == parameter).map(|(_, v)| *v)
    }
}

/// Combinations and their outputs, index-aligned
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub combinations: Vec<ParameterCombination>,
    pub results: Vec<SimulationOutput>,
}

/// Grid of parameter axes over a base configuration
#[derive(Debug, Clone)]
pub struct ParameterSweep {
    base: SimulationParameters,
    axes: Vec<(SweepParameter, Vec<f64>)>,
    n_jobs: usize,
}

impl ParameterSweep {
    pub fn new(base: SimulationParameters) -> Self {
        Self {
            base,
            axes: Vec::new(),
            n_jobs: 1,
        }
    }

    pub fn with_axis(mut self, parameter: SweepParameter, values: Vec<f64>) -> Self {
        self.axes.push((parameter, values));
        self
    }

    /// Add an axis by parameter name
    pub fn axis(self, name: &str, values: Vec<f64>) -> EngineResult<Self> {
        let parameter = name.parse()?;
        Ok(self.with_axis(parameter, values))
    }

    /// Worker count; 0 lets the pool pick one per core
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn axes(&self) -> &[(SweepParameter, Vec<f64>)] {
        &self.axes
    }

    /// Cartesian product of all axes, first axis slowest
    pub fn combinations(&self) -> Vec<ParameterCombination> {
        let mut points: Vec<Vec<(SweepParameter, f64)>> = vec![Vec::new()];
        for (parameter, values) in &self.axes {
            points = points
                .iter()
                .flat_map(|prefix| {
                    values.iter().map(move |&value| {
                        let mut point = prefix.clone();
                        point.push((*parameter, value));
                        point
                    })
                })
                .collect();
        }

        points
            .into_iter()
            .map(|values| {
                let mut params = self.base;
                for (parameter, value) in &values {
                    parameter.apply(&mut params, *value);
                }
                ParameterCombination { values, params }
            })
            .collect()
    }

    /// Run every combination
    ///
    /// # Errors
    /// `EngineError::SweepCombination` wrapping the error of a failed combination.
    pub fn run<I>(&self, connectivity: &Connectivity, initial: &I) -> EngineResult<SweepResult>
    where
        I: InitialConditions + Sync,
    {
        let combinations = self.combinations();
        let start = Instant::now();
        info!(
            "[SWEEP] Running {} combinations over {} axes with {} workers",
            combinations.len(),
            self.axes.len(),
            if self.n_jobs == 0 { "all".to_string() } else { self.n_jobs.to_string() }
        );

        let results = self.run_combinations(&combinations, connectivity, initial)?;

        info!(
            "[SWEEP] Completed {} combinations in {:.2?}",
            results.len(),
            start.elapsed()
        );
        Ok(SweepResult {
            combinations,
            results,
        })
    }

    #[cfg(feature = "parallel")]
    fn run_combinations<I>(
        &self,
        combinations: &[ParameterCombination],
        connectivity: &Connectivity,
        initial: &I,
    ) -> EngineResult<Vec<SimulationOutput>>
    where
        I: InitialConditions + Sync,
    {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_jobs)
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;

        pool.install(|| {
            combinations
                .par_iter()
                .enumerate()
                .map(|(index, combination)| run_combination(index, combination, connectivity, initial))
                .collect()
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn run_combinations<I>(
        &self,
        combinations: &[ParameterCombination],
        connectivity: &Connectivity,
        initial: &I,
    ) -> EngineResult<Vec<SimulationOutput>>
    where
        I: InitialConditions + Sync,
    {
        combinations
            .iter()
            .enumerate()
            .map(|(index, combination)| run_combination(index, combination, connectivity, initial))
            .collect()
    }
}

fn run_combination<I: InitialConditions>(
    index: usize,
    combination: &ParameterCombination,
    connectivity: &Connectivity,
    initial: &I,
) -> EngineResult<SimulationOutput> {
    let output = run_simulation(combination.params, connectivity, initial).map_err(|e| {
        EngineError::SweepCombination {
            index,
            source: Box::new(e),
        }
    })?;
    debug!("[SWEEP] Combination {} done: {:?}", index, combination.values);
    Ok(output)
}

/// Convenience wrapper: sweep `axes` over `base` with `n_jobs` workers
pub fn run_sweep<I>(
    base: SimulationParameters,
    axes: Vec<(SweepParameter, Vec<f64>)>,
    n_jobs: usize,
    connectivity: &Connectivity,
    initial: &I,
) -> EngineResult<SweepResult>
where
    I: InitialConditions + Sync,
{
    axes.into_iter()
        .fold(ParameterSweep::new(base), |sweep, (parameter, values)| {
            sweep.with_axis(parameter, values)
        })
        .n_jobs(n_jobs)
        .run(connectivity, initial)
}
