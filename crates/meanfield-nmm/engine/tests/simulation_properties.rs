// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for whole-run behaviour of the simulator
//!
//! Determinism, chunked-vs-whole equivalence, rate non-negativity, BOLD cadence
//! and fail-fast configuration checks.

use meanfield_engine::{
    run_simulation, ConstantInitialConditions, Connectivity, EngineError, SimulationOutput, SimulationParameters,
    Simulator,
};
use meanfield_neural::CouplingKind;
use ndarray::{s, Array2, ArrayViewMut3, Axis};

// ===== Helper Functions =====

const WINDOW: f64 = 6.4; // 64 steps at dt = 0.1

/// 64-step windows, 4 sub-windows, `windows` windows, BOLD every `bold_skip` windows
///
/// Horizons carry half a window of slack so the window counts do not hinge on
/// floating-point rounding.
fn params(windows: usize, bold_skip: usize) -> SimulationParameters {
    SimulationParameters {
        dt: 0.1,
        history_length: 64,
        tavg_subwindows: 4,
        total_time: WINDOW * (windows as f64 + 0.5),
        bold_tr: WINDOW * (bold_skip as f64 + 0.5),
        r_sigma: 0.01,
        v_sigma: 0.01,
        ..Default::default()
    }
}

fn network() -> Connectivity {
    Connectivity::random(6, 5.0, 17).unwrap()
}

/// Compare traces by bit pattern so NaN samples compare equal to themselves
fn assert_bit_identical(a: &SimulationOutput, b: &SimulationOutput) {
    assert_eq!(a.tavg.mapv(f32::to_bits), b.tavg.mapv(f32::to_bits));
    assert_eq!(a.bold.mapv(f32::to_bits), b.bold.mapv(f32::to_bits));
}

// ===== Determinism =====

#[test]
fn test_same_seed_is_bit_identical() {
    let ic = ConstantInitialConditions::default();
    let a = run_simulation(params(5, 2), &network(), &ic).unwrap();
    let b = run_simulation(params(5, 2), &network(), &ic).unwrap();
    assert_bit_identical(&a, &b);
}

#[test]
fn test_same_seed_is_bit_identical_when_bold_diverges() {
    let ic = ConstantInitialConditions::default();
    let coarse = SimulationParameters {
        dt: 1.0,
        total_time: 64.0 * 6.5,
        bold_tr: 64.0,
        ..params(6, 1)
    };
    assert!(!coarse.bold_is_stable());

    let a = run_simulation(coarse, &network(), &ic).unwrap();
    let b = run_simulation(coarse, &network(), &ic).unwrap();
    assert_eq!(a.bold.dim(), (7, 6));
    assert!(a.bold.iter().any(|x| !x.is_finite()));
    assert_bit_identical(&a, &b);
}

#[test]
fn test_different_seed_differs() {
    let ic = ConstantInitialConditions::default();
    let a = run_simulation(params(5, 2), &network(), &ic).unwrap();
    let mut other = params(5, 2);
    other.seed = 43;
    let b = run_simulation(other, &network(), &ic).unwrap();
    assert_ne!(a.tavg, b.tavg);
}

#[test]
fn test_chunked_advance_matches_whole_run() {
    let ic = ConstantInitialConditions::default();
    let whole = run_simulation(params(6, 2), &network(), &ic).unwrap();

    let mut sim = Simulator::new(params(6, 2), &network(), &ic).unwrap();
    let total = 6 * 64;
    let mut done = 0u64;
    for chunk in [1u64, 37, 64, 5, 100, 13].iter().cycle() {
        let steps = (*chunk).min(total - done);
        sim.advance(steps, None).unwrap();
        done += steps;
        if done == total {
            break;
        }
    }
    assert_bit_identical(&sim.output(), &whole);
}

// ===== Properties =====

#[test]
fn test_rate_never_negative_under_large_noise() {
    let mut noisy = params(4, 2);
    noisy.r_sigma = 5.0;
    noisy.v_sigma = 5.0;
    let mut sim = Simulator::new(noisy, &network(), &ConstantInitialConditions::default()).unwrap();
    let raw = sim.advance(4 * 64, None).unwrap();

    assert!(raw.states.index_axis(Axis(1), 0).iter().all(|&r| r >= 0.0));
    // clamping must actually have happened somewhere
    assert!(raw.states.index_axis(Axis(1), 0).iter().any(|&r| r == 0.0));
    let out = sim.output();
    assert!(out.tavg.slice(s![.., 0, ..]).iter().all(|&r| r >= 0.0));
}

#[test]
fn test_bold_cadence_rows() {
    let ic = ConstantInitialConditions::default();
    // 10 windows, every 3rd sampled: windows 0, 3, 6, 9
    let out = run_simulation(params(10, 3), &network(), &ic).unwrap();
    assert_eq!(out.tavg.dim(), (10 * 4, 2, 6));
    assert_eq!(out.bold.dim(), (10 / 3 + 1, 6));
    assert!(out.bold.iter().all(|x| x.is_finite()));
    assert!(out.bold.row(3).iter().any(|&x| x != 0.0));
}

#[test]
fn test_unwritten_bold_row_stays_zero() {
    let ic = ConstantInitialConditions::default();
    // 9 windows, every 3rd sampled: windows 0, 3, 6 -> rows 0..=2, row 3 never written
    let out = run_simulation(params(9, 3), &network(), &ic).unwrap();
    assert_eq!(out.bold.dim(), (4, 6));
    assert!(out.bold.row(2).iter().any(|&x| x != 0.0));
    assert!(out.bold.row(3).iter().all(|&x| x == 0.0));
}

#[test]
fn test_zero_windows_gives_empty_traces() {
    let mut short = params(1, 1);
    short.total_time = 0.5 * WINDOW;
    let out = run_simulation(short, &network(), &ConstantInitialConditions::default()).unwrap();
    assert_eq!(out.tavg.dim(), (0, 2, 6));
    assert_eq!(out.bold.dim(), (1, 6));
    assert!(out.bold.iter().all(|&x| x == 0.0));
}

#[test]
fn test_difference_coupling_runs() {
    let mut linear = params(3, 1);
    linear.coupling_scale = 0.5;
    linear.model.cr = 1.0;
    let diff = SimulationParameters {
        coupling: CouplingKind::Difference,
        ..linear
    };
    let out = run_simulation(diff, &network(), &ConstantInitialConditions::default()).unwrap();
    let linear = run_simulation(linear, &network(), &ConstantInitialConditions::default()).unwrap();
    assert_eq!(out.tavg.dim(), linear.tavg.dim());
    assert_ne!(out.tavg, linear.tavg);
}

#[test]
fn test_custom_initial_conditions_are_used() {
    fn high_potential(_offsets: &[f64], mut history: ArrayViewMut3<'_, f32>) {
        history.index_axis_mut(Axis(0), 0).fill(0.1);
        history.index_axis_mut(Axis(0), 1).fill(-1.0);
    }
    let sim = Simulator::new(params(2, 1), &network(), &high_potential).unwrap();
    assert_eq!(sim.history().rate(10, 3), 0.1);
    assert_eq!(sim.history().potential(63, 0), -1.0);
}

// ===== Configuration Errors =====

#[test]
fn test_delay_beyond_history_fails_fast() {
    let conn = Connectivity::new(Array2::ones((2, 2)), Array2::from_elem((2, 2), 10.0)).unwrap();
    let result = run_simulation(params(2, 1), &conn, &ConstantInitialConditions::default());
    assert!(matches!(
        result,
        Err(EngineError::DelayExceedsHistory {
            steps,
            history_length: 64,
            ..
        }) if (99..=100).contains(&steps)
    ));
}

#[test]
fn test_invalid_parameters_fail_fast() {
    let mut bad = params(2, 1);
    bad.history_length = 48;
    assert_eq!(
        run_simulation(bad, &network(), &ConstantInitialConditions::default()),
        Err(EngineError::HistoryNotPowerOfTwo(48))
    );

    let mut bad = params(2, 1);
    bad.dt = 0.0;
    assert!(run_simulation(bad, &network(), &ConstantInitialConditions::default()).is_err());

    let mut bad = params(2, 1);
    bad.model.tau = 0.0;
    assert!(run_simulation(bad, &network(), &ConstantInitialConditions::default()).is_err());
}
