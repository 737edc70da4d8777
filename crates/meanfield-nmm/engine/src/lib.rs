// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Meanfield Engine
//!
//! Delayed-coupling network integrator for neural-mass models.
//!
//! ## Pipeline
//! - Window noise drawn once per history window from a seeded generator
//! - Window kernel: coupling, RK4, noise, clamping, temporal average, BOLD
//! - Driver: resumable stepping, trace recording, proxy-node injection
//! - Sweeps: Cartesian parameter grids on a bounded rayon pool
//!
//! ## Architecture
//! - Single-threaded, allocation-free hot path over contiguous `f32` planes
//! - Power-of-two ring buffer, every wrap is a bit mask
//! - Coupling dispatched once per call into a monomorphized kernel

pub mod connectivity;
pub mod error;
pub mod history;
pub mod initial;
mod kernel;
pub mod monitors;
pub mod noise;
pub mod parameters;
pub mod proxy;
pub mod simulator;
pub mod sweep;

pub use connectivity::Connectivity;
pub use error::{EngineError, EngineResult};
pub use history::{DiscreteDelays, HistoryBuffer};
pub use initial::{ConstantInitialConditions, InitialConditions};
pub use monitors::{BoldMonitor, TemporalAverage, TraceRecorder};
pub use noise::{NoiseBuffer, NoiseSource};
pub use parameters::SimulationParameters;
pub use proxy::ProxyInjection;
pub use simulator::{run_simulation, RawChunk, SimulationOutput, Simulator};
pub use sweep::{run_sweep, ParameterCombination, ParameterSweep, SweepParameter, SweepResult};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
