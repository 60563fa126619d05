//! Benchmarks for equirisk-math operations.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use equirisk_math::{constrained_wls, ewm_factor_covariance, nearest_correlation, winsorize, z_score};
use ndarray::{Array1, Array2};
use rand::Rng;

fn random_array(n: usize) -> Array1<f64> {
    let mut rng = rand::thread_rng();
    Array1::from_iter((0..n).map(|_| rng.r#gen::<f64>() * 0.1 - 0.05))
}

fn random_matrix(rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((rows, cols), |_| rng.r#gen::<f64>() * 0.04 - 0.02)
}

/// `[market | styles | industries]`, stocks assigned to industries round-robin.
fn factor_design(n_stocks: usize, n_styles: usize, n_industries: usize) -> Array2<f64> {
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((n_stocks, 1 + n_styles + n_industries), |(i, j)| {
        if j == 0 {
            1.0
        } else if j <= n_styles {
            rng.gen_range(-3.0..3.0)
        } else if j - 1 - n_styles == i % n_industries {
            1.0
        } else {
            0.0
        }
    })
}

fn bench_winsorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("winsorize");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_array(size);
            b.iter(|| winsorize(black_box(&data), black_box(3.0)));
        });
    }

    group.finish();
}

fn bench_weighted_z_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("z_score");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_array(size);
            let weights = Array1::from_iter((0..size).map(|i| ((i + 1) as f64).sqrt()));
            b.iter(|| z_score(black_box(&data), Some(black_box(&weights))).unwrap());
        });
    }

    group.finish();
}

fn bench_constrained_wls(c: &mut Criterion) {
    let mut group = c.benchmark_group("constrained_wls");
    group.sample_size(30);

    for (n_stocks, n_industries) in [(100, 10), (800, 20), (2500, 30)] {
        let n_styles = 6;
        group.bench_with_input(
            BenchmarkId::new("stocks_industries", format!("{n_stocks}_{n_industries}")),
            &(n_stocks, n_industries),
            |b, &(n_stocks, n_industries)| {
                let y = random_array(n_stocks);
                let x = factor_design(n_stocks, n_styles, n_industries);
                let weights = Array1::from_iter((0..n_stocks).map(|i| ((i + 1) as f64 * 1e6).sqrt()));
                let mut constraint = Array1::zeros(x.ncols());
                for j in 0..n_industries {
                    constraint[1 + n_styles + j] = 1.0 / n_industries as f64;
                }

                b.iter(|| {
                    constrained_wls(black_box(&y), black_box(&x), black_box(&weights), black_box(&constraint))
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_ewm_covariance(c: &mut Criterion) {
    let mut group = c.benchmark_group("ewm_factor_covariance");

    for (days, factors) in [(90, 20), (252, 30), (252, 50)] {
        group.bench_with_input(
            BenchmarkId::new("days_factors", format!("{days}x{factors}")),
            &(days, factors),
            |b, &(days, factors)| {
                let returns = random_matrix(days, factors);
                b.iter(|| ewm_factor_covariance(black_box(&returns), black_box(90.0)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_nearest_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_correlation");
    group.sample_size(20);

    for n in [5, 20, 40] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let corr = Array2::from_shape_fn((n, n), |(i, j)| if i == j { 1.0 } else { 0.95 - 0.9 * ((i + j) % 2) as f64 });
            b.iter(|| nearest_correlation(black_box(&corr), 1e-8).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_winsorize,
    bench_weighted_z_score,
    bench_constrained_wls,
    bench_ewm_covariance,
    bench_nearest_correlation,
);

criterion_main!(benches);
