// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Window Noise
//!
//! Standard-normal draws for a whole window `(2, len, nodes)` are generated at once
//! at the start of each window rather than per step. The generator is owned by the
//! simulation and seeded once, so identical seeds give bit-identical traces.
//! Intensity and `sqrt(dt)` scaling are applied inside the kernel.

use meanfield_neural::STATE_VARIABLES;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Seeded source of standard-normal `f32` samples
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: StdRng,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn next_standard_normal(&mut self) -> f32 {
        self.rng.sample(StandardNormal)
    }

    /// Overwrite `out` with fresh N(0, 1) samples
    pub fn fill_standard_normal(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_standard_normal();
        }
    }
}

/// Noise for one window: plane 0 drives r, plane 1 drives V
#[derive(Debug, Clone)]
pub struct NoiseBuffer {
    data: Array3<f32>,
    plane: usize,
}

impl NoiseBuffer {
    pub fn new(len: usize, nodes: usize) -> Self {
        Self {
            data: Array3::zeros((STATE_VARIABLES, len, nodes)),
            plane: len * nodes,
        }
    }

    /// Redraw the whole window
    pub fn refill(&mut self, source: &mut NoiseSource) {
        let flat = self
            .data
            .as_slice_mut()
            .expect("noise buffer is allocated in standard layout");
        source.fill_standard_normal(flat);
    }

    /// Rate and potential noise planes, `len * nodes` each, slot-major
    #[inline]
    pub(crate) fn planes(&self) -> (&[f32], &[f32]) {
        self.data
            .as_slice()
            .expect("noise buffer is allocated in standard layout")
            .split_at(self.plane)
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }
}
