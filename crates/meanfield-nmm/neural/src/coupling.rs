// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Coupling Functions
//!
//! Delayed coupling between nodes is computed in three parts:
//!
//! ```text
//! c_i = post( Σ_j  W[i,j] · pre(x_j(t - d_ij), x_i(t)) )
//! ```
//!
//! `pre` runs once per edge (N² times per step) and `post` once per node, so both
//! must stay branch-free. The engine never calls through a trait object: a
//! [`CouplingKind`] is matched once per integration call and the kernel is
//! monomorphized over the concrete [`CouplingFunction`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-edge and post-summation coupling transform
pub trait CouplingFunction: Copy + Send + Sync + 'static {
    /// Transform the delayed source state before weighting and summation.
    ///
    /// `target` is the current state of the receiving node.
    fn pre(&self, source: f32, target: f32) -> f32;

    /// Transform the weighted sum of all incoming edges.
    fn post(&self, summed: f32) -> f32;
}

/// Linear coupling: `pre(x_j, x_i) = x_j`, `post(g) = scale · g`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCoupling {
    pub scale: f32,
}

impl LinearCoupling {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }
}

impl Default for LinearCoupling {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl CouplingFunction for LinearCoupling {
    #[inline(always)]
    fn pre(&self, source: f32, _target: f32) -> f32 {
        source
    }

    #[inline(always)]
    fn post(&self, summed: f32) -> f32 {
        self.scale * summed
    }
}

/// Diffusive coupling: `pre(x_j, x_i) = x_j - x_i`, `post(g) = scale · g`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferenceCoupling {
    pub scale: f32,
}

impl DifferenceCoupling {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }
}

impl CouplingFunction for DifferenceCoupling {
    #[inline(always)]
    fn pre(&self, source: f32, target: f32) -> f32 {
        source - target
    }

    #[inline(always)]
    fn post(&self, summed: f32) -> f32 {
        self.scale * summed
    }
}

/// Closed set of coupling policies selectable at run time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CouplingKind {
    #[default]
    Linear,
    Difference,
}

impl CouplingKind {
    pub fn name(&self) -> &'static str {
        match self {
            CouplingKind::Linear => "linear",
            CouplingKind::Difference => "difference",
        }
    }

    /// Parse a policy name as written in configuration files
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(CouplingKind::Linear),
            "difference" | "diff" => Some(CouplingKind::Difference),
            _ => None,
        }
    }
}
