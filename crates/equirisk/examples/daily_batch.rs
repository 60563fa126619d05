//! Example: daily batch followed by portfolio analytics
//!
//! Seeds an in-memory store with a synthetic KOSPI universe, then
//! 1. runs the regional pipeline (safety gate, factor model, indicators, integrity)
//! 2. analyses a three-stock portfolio against the stored model
//! 3. simulates the portfolio forward with both path generators
//!
//! Run with: `cargo run --example daily_batch --features full`

use equirisk::{
    model::InMemoryStore,
    pipeline::{PipelineSafetyController, init_default_logging},
    portfolio::{Portfolio, PortfolioAnalysisService},
    primitives::{
        Benchmark, Country, Date, FundamentalSnapshot, Holding, Market, MarketGroup, PriceBar,
        SimulationMethod, Stock, StockId,
    },
    simulation::{PortfolioSimulationService, SimulationConfig},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;

const SECTORS: [&str; 4] = ["Banks", "Energy", "Tech", "Retail"];
const STOCKS: u64 = 60;
const TRADING_DAYS: u64 = 300;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_default_logging()?;

    let as_of = Date::from_ymd_opt(2024, 12, 30).ok_or("invalid date")?;
    let mut store = synthetic_universe(as_of);

    let controller = PipelineSafetyController::<InMemoryStore>::new();
    let report = controller.run_region(&mut store, MarketGroup::Kr, as_of)?;
    println!("{}", serde_json::to_string_pretty(&report.steps)?);

    let holdings = [(1000, 120), (1007, 45), (1021, 300)]
        .into_iter()
        .map(|(id, shares)| {
            Holding::new(StockId::new(id), Decimal::from(shares), Decimal::from(20_000), "KRW", as_of)
        })
        .collect();
    let portfolio = Portfolio::new(1, Some(MarketGroup::Kr), holdings);

    let analysis = PortfolioAnalysisService::new().full_analysis(&store, &portfolio)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);

    for method in [SimulationMethod::Bootstrap, SimulationMethod::Gbm] {
        let config = SimulationConfig::default().with_method(method).with_seed(42);
        let simulation = PortfolioSimulationService::with_config(config)?.run(&store, &portfolio)?;
        println!("{}", serde_json::to_string_pretty(&simulation)?);
    }

    Ok(())
}

fn synthetic_universe(as_of: Date) -> InMemoryStore {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut store = InMemoryStore::new();
    let first = as_of - chrono::Days::new(TRADING_DAYS - 1);
    let dates: Vec<Date> = (0..TRADING_DAYS).map(|d| first + chrono::Days::new(d)).collect();

    let mut index = 2_500.0;
    let benchmark: Vec<f64> = dates
        .iter()
        .map(|_| {
            index *= 1.0 + rng.gen_range(-0.012..0.013);
            index
        })
        .collect();
    store.set_benchmark_prices(
        Benchmark::KrKospi,
        dates.iter().zip(&benchmark).map(|(d, c)| bar(*d, *c)),
    );
    store.set_risk_free_rate(Country::Kr, 3.25);

    for i in 0..STOCKS {
        let id = StockId::new(1000 + i);
        let sector = SECTORS[(i % SECTORS.len() as u64) as usize];
        store.add_stock(Stock::new(id, format!("{:06}", 5930 + i), Market::KrKospi, Some(sector)));

        let beta = rng.gen_range(0.5..1.5);
        let mut close = rng.gen_range(5_000.0..80_000.0);
        let bars: Vec<PriceBar> = dates
            .iter()
            .enumerate()
            .map(|(d, date)| {
                let market = if d == 0 { 0.0 } else { benchmark[d] / benchmark[d - 1] - 1.0 };
                close *= 1.0 + beta * market + rng.gen_range(-0.015..0.015);
                bar(*date, close)
            })
            .collect();
        store.add_prices(id, bars);

        store.set_fundamentals(FundamentalSnapshot {
            stock_id: id,
            shares_outstanding: Some(Decimal::from(rng.gen_range(1_000_000..90_000_000))),
            price_to_book: Decimal::from_f64_retain(rng.gen_range(0.4..5.0)),
            return_on_equity: Decimal::from_f64_retain(rng.gen_range(-0.1..0.3)),
            operating_margin: Decimal::from_f64_retain(rng.gen_range(-0.05..0.35)),
            debt_ratio: Decimal::from_f64_retain(rng.gen_range(0.1..1.2)),
        });
    }
    store
}

fn bar(date: Date, close: f64) -> PriceBar {
    PriceBar::new(date, Decimal::from_f64_retain(close).unwrap_or_default())
}
