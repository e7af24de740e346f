//! Resampler benchmarks: neighbour index build and full-cycle gridding.
//!
//! Run with: cargo bench -p sealevel-analysis --bench resampler_benchmark

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use sealevel_analysis::assembler::MergedCycle;
use sealevel_analysis::reference::OceanGrid;
use sealevel_analysis::resampler::{GaussianResampler, PointIndex, ResampleParams};

/// Pseudo-random ground tracks over the tropical band.
fn cloud(points: usize) -> MergedCycle {
    let mut cycle = MergedCycle::default();
    let mut state = 0x2545_f491_4f6c_dd1d_u64;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    for i in 0..points {
        cycle.time.push(i as f64);
        cycle.lat.push(-30.0 + 60.0 * next());
        cycle.lon.push(-180.0 + 360.0 * next());
        cycle.ssha.push(0.2 * next() - 0.1);
    }
    cycle
}

/// Half-degree grid over the same band.
fn grid() -> OceanGrid {
    let lats = (0..120).map(|i| -29.75 + 0.5 * i as f64).collect();
    let lons = (0..720).map(|j| -179.75 + 0.5 * j as f64).collect();
    OceanGrid::all_wet(lats, lons)
}

fn index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_index");
    for size in [10_000, 100_000] {
        let cycle = cloud(size);
        group.bench_with_input(BenchmarkId::new("build", size), &size, |b, _| {
            b.iter(|| PointIndex::build(&cycle.lat, &cycle.lon));
        });
    }
    group.finish();
}

fn resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("gaussian_resample");
    group.sample_size(10);
    let grid = grid();
    let center = NaiveDate::from_ymd_opt(2005, 3, 7).unwrap();
    for neighbours in [50, 500] {
        let cycle = cloud(200_000);
        let resampler = GaussianResampler::new(ResampleParams {
            neighbours,
            ..ResampleParams::default()
        });
        group.bench_with_input(
            BenchmarkId::new("neighbours", neighbours),
            &neighbours,
            |b, _| {
                b.iter(|| resampler.resample(center, &cycle, &grid).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, index_build, resample);
criterion_main!(benches);
