// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # meanfield - Delayed-Coupling Neural-Mass Network Simulator
//!
//! Simulates whole-brain networks of Montbrió–Pazó–Roxin firing-rate nodes
//! coupled through a weighted, delayed connectome, observed through a
//! temporal average and a Balloon–Windkessel BOLD signal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meanfield::prelude::*;
//!
//! let params = SimulationParameters {
//!     total_time: 10_000.0,
//!     ..Default::default()
//! };
//! let connectivity = Connectivity::random(16, 25.0, 42)?;
//! let output = run_simulation(params, &connectivity, &ConstantInitialConditions::default())?;
//! println!("tavg {:?}, bold {:?}", output.tavg.dim(), output.bold.dim());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//! - **`parallel-sweep`** (default): sweep combinations on a rayon pool
//! - **`file-logging`** (default): JSON log files per run
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  meanfield-neural                                       │
//! │  (model equations, coupling, hemodynamics)              │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  meanfield-engine                                       │
//! │  (history ring, window kernel, driver, sweeps)          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  meanfield (this crate) + meanfield-config              │
//! │  (configuration to engine objects, JSON output)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use meanfield_config as config;
pub use meanfield_engine as engine;
pub use meanfield_neural as neural;
pub use meanfield_observability as observability;

pub mod output;
pub mod setup;

pub use output::{ArrayRecord, OutputFile, RunRecord};
pub use setup::{
    connectivity_from_config, initial_from_config, logging_options, parameters_from_config,
    read_matrix, sweep_from_config, SetupError, SetupResult,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::engine::{
        run_simulation, run_sweep, Connectivity, ConstantInitialConditions, EngineError, EngineResult,
        InitialConditions, ParameterSweep, ProxyInjection, SimulationOutput, SimulationParameters,
        Simulator, SweepParameter, SweepResult,
    };
    pub use crate::neural::{CouplingKind, MontbrioParameters};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let params = SimulationParameters::default();
        assert_eq!(params.coupling, CouplingKind::Linear);
        assert!(!crate::VERSION.is_empty());
    }
}
