// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network Connectivity
//!
//! Weight and delay matrices share the indexing convention
//! `M[i, j]` = edge **from node j to node i**. Both are immutable for a run.

use crate::error::{EngineError, EngineResult};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Validated pair of weight and delay matrices
#[derive(Debug, Clone, PartialEq)]
pub struct Connectivity {
    weights: Array2<f64>,
    delays: Array2<f64>,
}

impl Connectivity {
    /// Build from weights and delays (delays in simulation time units)
    ///
    /// # Errors
    /// Fails on non-square or mismatched matrices, an empty network, or a negative
    /// or non-finite delay.
    pub fn new(weights: Array2<f64>, delays: Array2<f64>) -> EngineResult<Self> {
        let (rows, cols) = weights.dim();
        if rows != cols {
            return Err(EngineError::NonSquareMatrix {
                name: "weights",
                rows,
                cols,
            });
        }
        if weights.dim() != delays.dim() {
            return Err(EngineError::ShapeMismatch {
                weights: weights.dim(),
                delays: delays.dim(),
            });
        }
        if rows == 0 {
            return Err(EngineError::EmptyNetwork);
        }
        for ((to, from), &value) in delays.indexed_iter() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidDelay { from, to, value });
            }
        }
        Ok(Self { weights, delays })
    }

    /// Random dense network: `W = z²` with `z ~ N(0, 1)`, `D = u² · max_delay` with `u ~ U[0, 1)`
    pub fn random(nodes: usize, max_delay: f64, seed: u64) -> EngineResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let weights = Array2::from_shape_simple_fn((nodes, nodes), || {
            let z: f64 = rng.sample(StandardNormal);
            z * z
        });
        let delays = Array2::from_shape_simple_fn((nodes, nodes), || {
            let u: f64 = rng.gen();
            u * u * max_delay
        });
        Self::new(weights, delays)
    }

    pub fn nodes(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn delays(&self) -> &Array2<f64> {
        &self.delays
    }

    /// Largest delay in time units
    pub fn max_delay(&self) -> f64 {
        self.delays.iter().copied().fold(0.0, f64::max)
    }
}
