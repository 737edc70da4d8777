// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neural-Mass Model Architecture
//!
//! A model supplies per-node derivatives and a deterministic step; stochastic
//! increments, coupling and buffering belong to the engine.
//!
//! ## Adding a New Model
//!
//! 1. Create `src/models/your_model.rs`
//! 2. Implement `ModelParameters` for its parameter struct
//! 3. Add tests
//! 4. Export in `mod.rs`

pub mod montbrio;
pub mod traits;

// Re-export core types
pub use montbrio::{MontbrioModel, MontbrioParameters, STATE_VARIABLES};
pub use traits::ModelParameters;
