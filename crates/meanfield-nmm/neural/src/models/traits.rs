// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Model-specific parameter set
pub trait ModelParameters: Copy + Send + Sync {
    /// Check physical admissibility of the parameter values
    fn validate(&self) -> Result<(), &'static str>;
}
