//! Benchmarks for equirisk-model cross-section estimation.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use equirisk_model::{DesignMatrix, FactorModelService, InMemoryStore, fit_cross_section};
use equirisk_primitives::{Date, FundamentalSnapshot, Market, PriceBar, Stock, StockId};
use equirisk_styles::{ExposureBuilder, ExposureSet, StockInputs};
use ndarray::Array1;
use rand::Rng;
use rust_decimal::Decimal;

const SECTORS: [&str; 11] = [
    "Energy",
    "Materials",
    "Industrials",
    "Discretionary",
    "Staples",
    "Health",
    "Financials",
    "Technology",
    "Communication",
    "Utilities",
    "Real Estate",
];

fn random_inputs(n_stocks: usize) -> Vec<StockInputs> {
    let mut rng = rand::thread_rng();
    (0..n_stocks)
        .map(|i| {
            let mut s = StockInputs::new(StockId::new(i as u64), Some(SECTORS[i % SECTORS.len()]));
            s.shares_outstanding = Some(rng.gen_range(1e6..1e9));
            s.price_to_book = Some(rng.gen_range(0.3..8.0));
            s.return_on_equity = Some(rng.gen_range(-0.2..0.4));
            s.operating_margin = Some(rng.gen_range(-0.1..0.5));
            s.debt_ratio = Some(rng.gen_range(0.0..1.5));
            s.prices.close = Some(rng.gen_range(5.0..500.0));
            s.prices.return_today = Some(rng.gen_range(-0.05..0.05));
            s.prices.reference_long = s.prices.close;
            s.prices.reference_short = Some(rng.gen_range(5.0..500.0));
            s.prices.ewm_volatility = Some(rng.gen_range(0.005..0.06));
            s
        })
        .collect()
}

fn exposures(n_stocks: usize) -> (ExposureSet, Array1<f64>) {
    let inputs = random_inputs(n_stocks);
    let returns = inputs.iter().map(|s| s.prices.return_today.unwrap_or_default()).collect();
    (ExposureBuilder::new().build(&inputs).unwrap(), returns)
}

fn bench_exposures(c: &mut Criterion) {
    let mut group = c.benchmark_group("exposure_builder");
    group.sample_size(30);

    for n_stocks in [100, 1000, 3000] {
        let inputs = random_inputs(n_stocks);
        let builder = ExposureBuilder::new();
        group.throughput(Throughput::Elements(n_stocks as u64));
        group.bench_with_input(BenchmarkId::new("n_stocks", n_stocks), &inputs, |b, inputs| {
            b.iter(|| builder.build(black_box(inputs)).unwrap());
        });
    }

    group.finish();
}

fn bench_cross_section(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_section");
    group.sample_size(30);

    for n_stocks in [100, 1000, 3000, 5000] {
        let (set, returns) = exposures(n_stocks);
        group.throughput(Throughput::Elements(n_stocks as u64));
        group.bench_with_input(BenchmarkId::new("n_stocks", n_stocks), &(set, returns), |b, (set, returns)| {
            b.iter(|| {
                let design = DesignMatrix::build(black_box(set)).unwrap();
                fit_cross_section(&design, black_box(returns), &set.market_caps).unwrap()
            });
        });
    }

    group.finish();
}

fn seeded_store(n_stocks: usize, n_days: usize) -> InMemoryStore {
    let mut rng = rand::thread_rng();
    let mut store = InMemoryStore::new();
    let start = Date::from_ymd_opt(2023, 1, 2).unwrap();
    for i in 0..n_stocks {
        let id = StockId::new(i as u64);
        store.add_stock(Stock::new(id, format!("S{i:04}"), Market::UsNyse, Some(SECTORS[i % SECTORS.len()])));
        let mut price = rng.gen_range(10.0..200.0);
        let bars = (0..n_days).map(|d| {
            price *= 1.0 + rng.gen_range(-0.03..0.03);
            PriceBar::new(start + chrono::Days::new(d as u64), Decimal::from_f64_retain(price).unwrap_or_default())
        });
        store.add_prices(id, bars.collect::<Vec<_>>());
        store.set_fundamentals(FundamentalSnapshot {
            stock_id: id,
            shares_outstanding: Some(Decimal::from(rng.gen_range(1_000_000..500_000_000))),
            price_to_book: Decimal::from_f64_retain(rng.gen_range(0.3..8.0)),
            return_on_equity: Decimal::from_f64_retain(rng.gen_range(-0.2..0.4)),
            operating_margin: Decimal::from_f64_retain(rng.gen_range(-0.1..0.5)),
            debt_ratio: Decimal::from_f64_retain(rng.gen_range(0.0..1.5)),
        });
    }
    store
}

fn bench_service_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("service_run");
    group.sample_size(10);

    let service = FactorModelService::new();
    let date = Date::from_ymd_opt(2024, 6, 28).unwrap();
    for n_stocks in [200, 1000] {
        let store = seeded_store(n_stocks, 300);
        group.bench_with_input(BenchmarkId::new("n_stocks", n_stocks), &store, |b, store| {
            b.iter(|| {
                let mut uow = store.clone();
                service.run(black_box(&mut uow), Market::UsNyse, date).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_exposures, bench_cross_section, bench_service_run);

criterion_main!(benches);
