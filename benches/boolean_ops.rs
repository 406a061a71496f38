// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Benchmarks for the boolean pipeline over primitive pairs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use solidcut::boolean::{boolean, BooleanOp};
use solidcut::geometry::primitives::{make_box, make_cylinder, make_icosphere, Axis};
use solidcut::geometry::LatticePoint;

fn lp(x: i64, y: i64, z: i64) -> LatticePoint {
    LatticePoint::new(x, y, z)
}

fn bench_box_union(c: &mut Criterion) {
    let a = make_box(lp(-10, -10, -10), lp(10, 10, 10));
    let b = make_box(lp(0, 0, 0), lp(20, 20, 20));
    c.bench_function("union_offset_boxes", |bencher| {
        bencher.iter(|| boolean(BooleanOp::Union, black_box(&a), black_box(&b)).unwrap())
    });
}

fn bench_box_minus_cylinder(c: &mut Criterion) {
    let cube = make_box(lp(-100, -100, -100), lp(100, 100, 100));
    let drill = make_cylinder(Axis::X, 60.0, 150, 24);
    c.bench_function("difference_box_cylinder", |bencher| {
        bencher.iter(|| boolean(BooleanOp::DifferenceAb, black_box(&cube), black_box(&drill)).unwrap())
    });
}

fn bench_sphere_union(c: &mut Criterion) {
    let left = make_icosphere(lp(0, 0, 0), 200.0, 2);
    let right = make_icosphere(lp(150, 0, 0), 200.0, 2);
    c.bench_function("union_icospheres", |bencher| {
        bencher.iter(|| boolean(BooleanOp::Union, black_box(&left), black_box(&right)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_box_union,
    bench_box_minus_cylinder,
    bench_sphere_union
);
criterion_main!(benches);
