// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for proxy-node co-simulation
//!
//! A two-node network is integrated three ways: whole, and split into two
//! partitions that each own one node and receive the other as a proxy. The
//! partitions exchange their last chunk of raw states before every chunk; every
//! locally integrated column must match the whole-network run exactly.

use meanfield_engine::{
    ConstantInitialConditions, Connectivity, ProxyInjection, RawChunk, SimulationParameters, Simulator,
};
use ndarray::{s, Array2};

// ===== Helper Functions =====

const SYNC_STEPS: u64 = 4; // 0.4 time units at dt = 0.1
const SYNC_WINDOWS: usize = 120;

fn params() -> SimulationParameters {
    SimulationParameters {
        dt: 0.1,
        history_length: 128,
        tavg_subwindows: 16,
        total_time: 128.0 * 0.1 * 4.0,
        bold_tr: 30.0,
        seed: 42,
        ..Default::default()
    }
}

fn network() -> Connectivity {
    Connectivity::new(Array2::ones((2, 2)), Array2::from_elem((2, 2), 10.0)).unwrap()
}

/// Raw states of `node` from `chunk`, packaged for the other partition
fn proxy_values(chunk: &RawChunk, node: usize) -> ProxyInjection {
    ProxyInjection::new(
        chunk.times.clone(),
        chunk.states.slice(s![.., .., node..node + 1]).to_owned(),
    )
}

// ===== Tests =====

#[test]
fn test_partitions_match_whole_network() {
    let ic = ConstantInitialConditions::default();
    let mut whole = Simulator::new(params(), &network(), &ic).unwrap();
    // partition A integrates node 0, partition B integrates node 1
    let mut part_a = Simulator::new(params(), &network(), &ic)
        .unwrap()
        .with_proxies(&[1])
        .unwrap();
    let mut part_b = Simulator::new(params(), &network(), &ic)
        .unwrap()
        .with_proxies(&[0])
        .unwrap();

    let mut to_a: Option<ProxyInjection> = None;
    let mut to_b: Option<ProxyInjection> = None;

    for sync in 0..SYNC_WINDOWS {
        let reference = whole.advance(SYNC_STEPS, None).unwrap();
        let chunk_a = part_a.advance(SYNC_STEPS, to_a.as_ref()).unwrap();
        let chunk_b = part_b.advance(SYNC_STEPS, to_b.as_ref()).unwrap();

        assert_eq!(chunk_a.times, reference.times);
        assert_eq!(
            chunk_a.states.slice(s![.., .., 0]).mapv(f32::to_bits),
            reference.states.slice(s![.., .., 0]).mapv(f32::to_bits),
            "node 0 diverged at sync window {}",
            sync
        );
        assert_eq!(
            chunk_b.states.slice(s![.., .., 1]).mapv(f32::to_bits),
            reference.states.slice(s![.., .., 1]).mapv(f32::to_bits),
            "node 1 diverged at sync window {}",
            sync
        );

        to_a = Some(proxy_values(&chunk_b, 1));
        to_b = Some(proxy_values(&chunk_a, 0));
    }

    assert_eq!(whole.steps_done(), SYNC_STEPS * SYNC_WINDOWS as u64);
    assert_eq!(whole.windows_done(), 3);
}

#[test]
fn test_partition_monitors_match_whole_network() {
    let ic = ConstantInitialConditions::default();
    let mut whole = Simulator::new(params(), &network(), &ic).unwrap();
    let mut part_a = Simulator::new(params(), &network(), &ic)
        .unwrap()
        .with_proxies(&[1])
        .unwrap();
    let mut part_b = Simulator::new(params(), &network(), &ic)
        .unwrap()
        .with_proxies(&[0])
        .unwrap();

    let mut to_a: Option<ProxyInjection> = None;
    let mut to_b: Option<ProxyInjection> = None;
    for _ in 0..SYNC_WINDOWS {
        whole.advance(SYNC_STEPS, None).unwrap();
        let chunk_a = part_a.advance(SYNC_STEPS, to_a.as_ref()).unwrap();
        let chunk_b = part_b.advance(SYNC_STEPS, to_b.as_ref()).unwrap();
        to_a = Some(proxy_values(&chunk_b, 1));
        to_b = Some(proxy_values(&chunk_a, 0));
    }

    let reference = whole.output();
    let out_a = part_a.output();
    let out_b = part_b.output();
    assert_eq!(reference.tavg.dim(), (3 * 16, 2, 2));
    assert_eq!(
        out_a.tavg.slice(s![.., .., 0]).mapv(f32::to_bits),
        reference.tavg.slice(s![.., .., 0]).mapv(f32::to_bits)
    );
    assert_eq!(
        out_b.tavg.slice(s![.., .., 1]).mapv(f32::to_bits),
        reference.tavg.slice(s![.., .., 1]).mapv(f32::to_bits)
    );
    assert_eq!(
        out_a.bold.column(0).mapv(f32::to_bits),
        reference.bold.column(0).mapv(f32::to_bits)
    );
    assert_eq!(
        out_b.bold.column(1).mapv(f32::to_bits),
        reference.bold.column(1).mapv(f32::to_bits)
    );
}

#[test]
fn test_strongly_coupled_partitions_match() {
    let mut strong = params();
    strong.coupling_scale = 0.5;
    strong.model.cr = 1.0;
    strong.model.cv = 1.0;
    let ic = ConstantInitialConditions::default();

    let mut whole = Simulator::new(strong, &network(), &ic).unwrap();
    let mut part_a = Simulator::new(strong, &network(), &ic)
        .unwrap()
        .with_proxies(&[1])
        .unwrap();
    let mut part_b = Simulator::new(strong, &network(), &ic)
        .unwrap()
        .with_proxies(&[0])
        .unwrap();
    let mut isolated = Simulator::new(strong, &network(), &ic)
        .unwrap()
        .with_proxies(&[1])
        .unwrap();

    let mut to_a: Option<ProxyInjection> = None;
    let mut to_b: Option<ProxyInjection> = None;
    let mut isolated_diverged = false;
    for _ in 0..SYNC_WINDOWS {
        let reference = whole.advance(SYNC_STEPS, None).unwrap();
        let chunk_a = part_a.advance(SYNC_STEPS, to_a.as_ref()).unwrap();
        let chunk_b = part_b.advance(SYNC_STEPS, to_b.as_ref()).unwrap();
        // never receives node 1, so it sees a frozen neighbour
        let alone = isolated.advance(SYNC_STEPS, None).unwrap();

        assert_eq!(
            chunk_a.states.slice(s![.., .., 0]).mapv(f32::to_bits),
            reference.states.slice(s![.., .., 0]).mapv(f32::to_bits)
        );
        assert_eq!(
            chunk_b.states.slice(s![.., .., 1]).mapv(f32::to_bits),
            reference.states.slice(s![.., .., 1]).mapv(f32::to_bits)
        );
        isolated_diverged |= alone.states.slice(s![.., .., 0]) != reference.states.slice(s![.., .., 0]);

        to_a = Some(proxy_values(&chunk_b, 1));
        to_b = Some(proxy_values(&chunk_a, 0));
    }
    assert!(isolated_diverged);
}

#[test]
fn test_stale_injection_is_rejected() {
    let ic = ConstantInitialConditions::default();
    let mut sim = Simulator::new(params(), &network(), &ic)
        .unwrap()
        .with_proxies(&[1])
        .unwrap();
    sim.advance(200, None).unwrap();

    // step 10 fell out of the 128-step ring long ago
    let stale = ProxyInjection::new(vec![1.0], ndarray::Array3::zeros((1, 2, 1)));
    assert!(sim.advance(SYNC_STEPS, Some(&stale)).is_err());
    assert_eq!(sim.steps_done(), 200);
}
