//! Portfolio simulations against an in-memory store.
#![allow(missing_docs)]

use approx::assert_relative_eq;
use equirisk_model::InMemoryStore;
use equirisk_portfolio::Portfolio;
use equirisk_primitives::{
    DataCoverage, Date, Holding, Market, MarketGroup, PriceBar, SimulationMethod, Stock, StockId,
};
use equirisk_simulation::{PortfolioSimulationService, SimulationConfig, SimulationError};
use rstest::rstest;
use rust_decimal::Decimal;

fn start() -> Date {
    Date::from_ymd_opt(2024, 1, 1).unwrap()
}

fn bars(days: std::ops::Range<u64>, close: impl Fn(u64) -> f64) -> Vec<PriceBar> {
    days.map(|d| PriceBar::new(start() + chrono::Days::new(d), Decimal::from_f64_retain(close(d)).unwrap()))
        .collect()
}

fn holding(id: u64, shares: i64) -> Holding {
    Holding::new(StockId::new(id), Decimal::from(shares), Decimal::from(100), "USD", start())
}

fn seeded(days: usize, num_simulations: usize, method: SimulationMethod) -> PortfolioSimulationService {
    let config = SimulationConfig { days, num_simulations, ..Default::default() }.with_seed(17).with_method(method);
    PortfolioSimulationService::with_config(config).unwrap()
}

#[rstest]
#[case(SimulationMethod::Bootstrap)]
#[case(SimulationMethod::Gbm)]
fn flat_history_has_no_risk(#[case] method: SimulationMethod) {
    let mut store = InMemoryStore::new();
    store.add_stock(Stock::new(StockId::new(1), "FLAT", Market::UsNyse, Some("Utilities")));
    store.add_prices(StockId::new(1), bars(0..120, |_| 50.0));
    let portfolio = Portfolio::new(1, Some(MarketGroup::Us), vec![holding(1, 10)]);

    let report = seeded(10, 1000, method).run(&store, &portfolio).unwrap();

    assert_relative_eq!(report.results.expected_return, 0.0);
    assert_relative_eq!(report.results.var, 0.0);
    assert_relative_eq!(report.results.cvar, 0.0);
    assert_relative_eq!(report.target.current_value, 500.0);
    assert_relative_eq!(report.results.final_value_percentiles[&50], 500.0);
    assert_eq!(report.parameters.effective_lookback_days, 119);
    assert_eq!(report.data_coverage, DataCoverage::Full);
}

#[test]
fn short_holding_is_excluded_and_reported() {
    let mut store = InMemoryStore::new();
    store.add_stock(Stock::new(StockId::new(1), "AAA", Market::UsNasdaq, Some("Tech")));
    store.add_stock(Stock::new(StockId::new(2), "BBB", Market::UsNasdaq, Some("Tech")));
    store.add_prices(StockId::new(1), bars(0..150, |d| 100.0 + (d % 5) as f64));
    store.add_prices(StockId::new(2), bars(120..150, |d| 20.0 + (d % 3) as f64));
    let portfolio = Portfolio::new(2, Some(MarketGroup::Us), vec![holding(1, 3), holding(2, 50)]);

    let report = seeded(5, 200, SimulationMethod::Bootstrap).run(&store, &portfolio).unwrap();

    assert_eq!(report.data_coverage, DataCoverage::Partial);
    assert_eq!(report.excluded_stocks.len(), 1);
    assert_eq!(report.excluded_stocks[0].symbol, "BBB");
    assert_eq!(report.target.holdings_count, 1);
    assert_eq!(report.parameters.effective_lookback_days, 149);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["target"]["type"], "portfolio");
    assert_eq!(json["target"]["market_group"], "US");
    assert_eq!(json["method"], "bootstrap");
    assert_eq!(json["data_coverage"], "PARTIAL");
    assert!(json["results"]["final_value_percentiles"]["90"].is_number());
}

#[test]
fn too_little_history_is_a_caller_error() {
    let mut store = InMemoryStore::new();
    store.add_prices(StockId::new(1), bars(0..30, |d| 10.0 + d as f64));
    let portfolio = Portfolio::new(3, None, vec![holding(1, 1)]);

    let err = PortfolioSimulationService::new().run(&store, &portfolio).unwrap_err();
    assert!(matches!(err, SimulationError::InsufficientData { required: 60, actual: 29 }));
    assert!(err.is_caller_error());
}

#[test]
fn empty_portfolio_is_rejected() {
    let store = InMemoryStore::new();
    let err = PortfolioSimulationService::new().run(&store, &Portfolio::new(4, None, Vec::new())).unwrap_err();
    assert!(matches!(err, SimulationError::NoHoldings));
}

#[test]
fn seeded_requests_repeat() {
    let mut store = InMemoryStore::new();
    store.add_prices(StockId::new(1), bars(0..100, |d| 100.0 * (1.0 + 0.03 * ((d as f64) * 0.9).sin())));
    store.add_prices(StockId::new(2), bars(0..100, |d| 40.0 * (1.0 + 0.02 * ((d as f64) * 0.4).cos())));
    let portfolio = Portfolio::new(5, None, vec![holding(1, 2), holding(2, 5)]);

    let service = seeded(20, 500, SimulationMethod::Gbm);
    let first = service.run(&store, &portfolio).unwrap();
    let second = service.run(&store, &portfolio).unwrap();
    assert_eq!(first, second);
    assert!(first.results.cvar <= first.results.var);
    assert_eq!(first.target.market_group, "UNKNOWN");
}
