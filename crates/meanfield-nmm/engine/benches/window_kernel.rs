// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Window Kernel Benchmarks
//!
//! Time per history window for dense networks of increasing size. Each iteration
//! advances exactly one window, so noise generation is included.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meanfield_engine::{ConstantInitialConditions, Connectivity, SimulationParameters, Simulator};

fn bench_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_kernel");
    let params = SimulationParameters::default();
    let window = params.history_length as u64;

    for &nodes in &[16usize, 96, 256] {
        let conn = Connectivity::random(nodes, 25.0, 42).expect("random connectivity");
        let mut sim = Simulator::new(params, &conn, &ConstantInitialConditions::default()).expect("valid setup");

        // edges visited per window
        group.throughput(Throughput::Elements(window * (nodes * nodes) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.iter(|| black_box(sim.advance(window, None).expect("advance")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_window);
criterion_main!(benches);
