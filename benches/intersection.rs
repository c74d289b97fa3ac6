//! Watertight ray-triangle/quad intersection throughput (§4.3).

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use manta::geometry::intersection::{intersect_quad, intersect_triangle};
use manta::geometry::LightRay;
use manta::math::{Float, Vector3};

fn unit_triangle() -> (Vector3, Vector3, Vector3) {
    (
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
    )
}

fn unit_quad() -> (Vector3, Vector3, Vector3, Vector3) {
    (
        Vector3::new(-1.0, 0.0, -1.0),
        Vector3::new(1.0, 0.0, -1.0),
        Vector3::new(1.0, 0.0, 1.0),
        Vector3::new(-1.0, 0.0, 1.0),
    )
}

fn bench_triangle_hit(c: &mut Criterion) {
    let (v0, v1, v2) = unit_triangle();
    let ray = LightRay::new(Vector3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));
    c.bench_function("intersect_triangle_hit", |b| {
        b.iter(|| black_box(intersect_triangle(black_box(&ray), v0, v1, v2, Float::INFINITY)));
    });
}

fn bench_triangle_miss(c: &mut Criterion) {
    let (v0, v1, v2) = unit_triangle();
    let ray = LightRay::new(Vector3::new(5.5, 0.0, -1.0), Vector3::new(0.0, 0.0, 1.0));
    c.bench_function("intersect_triangle_miss", |b| {
        b.iter(|| black_box(intersect_triangle(black_box(&ray), v0, v1, v2, Float::INFINITY)));
    });
}

fn bench_quad_hit(c: &mut Criterion) {
    let (u, v, w, r) = unit_quad();
    let ray = LightRay::new(Vector3::new(0.1, 1.0, -0.1), Vector3::new(0.0, -1.0, 0.0));
    c.bench_function("intersect_quad_hit", |b| {
        b.iter(|| black_box(intersect_quad(black_box(&ray), u, v, w, r, Float::INFINITY)));
    });
}

criterion_group!(benches, bench_triangle_hit, bench_triangle_miss, bench_quad_hit);
criterion_main!(benches);
