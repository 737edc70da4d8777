// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neural-Mass Computation (Platform-Agnostic)
//!
//! ALL per-node mathematics in one place:
//! - **Models**: mean-field population models (Montbrió–Pazó–Roxin firing-rate model)
//! - **Coupling**: per-edge `pre` and post-summation `post` transforms
//! - **Hemodynamics**: Balloon–Windkessel BOLD observation model
//!
//! Nothing in this crate allocates or performs I/O. The network integrator in
//! `meanfield-engine` owns buffers and calls into these functions from its hot loop,
//! so every function on that path is `#[inline(always)]` and branch-free.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod coupling;
pub mod hemodynamics;

// Neural-mass models
pub mod models;

// Re-export everything for convenience
pub use coupling::{CouplingFunction, CouplingKind, DifferenceCoupling, LinearCoupling};
pub use hemodynamics::{euler_stability_limit, BalloonState};
pub use models::{ModelParameters, MontbrioModel, MontbrioParameters, STATE_VARIABLES};
