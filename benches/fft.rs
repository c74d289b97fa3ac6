//! Multi-threaded 2-D FFT/inverse-FFT throughput over the complex map
//! type shared by the diffraction pipeline and image-plane post
//! process (§4.8 step 2, §3 `ComplexMap2D`).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use num_complex::Complex64;

use manta::maps::ComplexMap2D;

fn checkerboard(side: usize) -> ComplexMap2D {
    let mut m = ComplexMap2D::new(side, side);
    for y in 0..side {
        for x in 0..side {
            m.set(x, y, Complex64::new(((x + y) % 2) as f64, 0.0));
        }
    }
    m
}

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft_forward");
    for side in [64usize, 256, 1024] {
        group.throughput(Throughput::Elements((side * side) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &side| {
            b.iter_batched(
                || checkerboard(side),
                |mut m| black_box(m.fft()),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft_roundtrip");
    for side in [64usize, 256] {
        group.throughput(Throughput::Elements((side * side) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &side| {
            b.iter_batched(
                || checkerboard(side),
                |mut m| {
                    m.fft();
                    black_box(m.ifft());
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fft, bench_roundtrip);
criterion_main!(benches);
