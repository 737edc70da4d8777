// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for engine operations
//!
//! Every variant is a configuration error raised before any step is integrated.
//! Numerical blow-ups (NaN, overflow) are not errors; they flow into the traces.

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while setting up or driving a simulation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Matrix '{name}' must be square, got {rows}x{cols}")]
    NonSquareMatrix {
        name: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("Shape mismatch: weights are {weights:?}, delays are {delays:?}")]
    ShapeMismatch {
        weights: (usize, usize),
        delays: (usize, usize),
    },

    #[error("Network must contain at least one node")]
    EmptyNetwork,

    #[error("Invalid delay {value} from node {from} to node {to}: delays must be finite and non-negative")]
    InvalidDelay { from: usize, to: usize, value: f64 },

    #[error(
        "Delay from node {from} to node {to} is {steps} steps, history holds only {history_length} (raise history_length)"
    )]
    DelayExceedsHistory {
        from: usize,
        to: usize,
        steps: u64,
        history_length: usize,
    },

    #[error("History length {0} must be a power of two")]
    HistoryNotPowerOfTwo(usize),

    #[error("Temporal-average sub-window count {subwindows} must divide history length {history_length}")]
    InvalidSubwindows {
        subwindows: usize,
        history_length: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Proxy node {node} is out of range for a {nodes}-node network")]
    ProxyNodeOutOfRange { node: usize, nodes: usize },

    #[error("Proxy injection shape {actual:?} does not match expected {expected:?}")]
    InjectionShape {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error(
        "Proxy injection at time {time} (step {step}) is outside the history window ending at step {current_step}"
    )]
    InjectionOutOfWindow {
        time: f64,
        step: i64,
        current_step: u64,
    },

    #[error("Unknown sweep parameter: {0}")]
    UnknownSweepParameter(String),

    #[error("Sweep failed for combination {index}: {source}")]
    SweepCombination {
        index: usize,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}
