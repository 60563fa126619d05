//! Concentration and diversification metrics.

use std::collections::HashMap;

use equirisk_math::stats::round_to;
use ndarray::Array1;
use serde::{Serialize, Serializer, ser::SerializeMap};

/// Sector bucket of holdings without a sector.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Concentration of a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiversificationMetrics {
    /// Herfindahl index `sum(w^2)`.
    pub hhi: f64,
    /// `1 / hhi`, 0 for an empty portfolio.
    pub effective_n: f64,
    /// Largest weight.
    pub max_weight: f64,
    /// Number of holdings.
    pub holdings_count: usize,
    /// `sum(w_i * vol_i) / portfolio_vol`, when volatilities were supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diversification_ratio: Option<f64>,
    /// Weight per sector, largest first.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "ordered_map")]
    pub sector_concentration: Option<Vec<(String, f64)>>,
    /// Herfindahl index over sector weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector_hhi: Option<f64>,
}

// Serialises the pairs as a JSON object in vector order.
fn ordered_map<S: Serializer>(pairs: &Option<Vec<(String, f64)>>, serializer: S) -> Result<S::Ok, S::Error> {
    match pairs {
        Some(pairs) => {
            let mut map = serializer.serialize_map(Some(pairs.len()))?;
            for (k, v) in pairs {
                map.serialize_entry(k, v)?;
            }
            map.end()
        }
        None => serializer.serialize_none(),
    }
}

/// Volatilities used for the diversification ratio.
#[derive(Debug, Clone, Copy)]
pub struct VolatilityInputs<'a> {
    /// Volatility of each holding, in weight order.
    pub individual: &'a Array1<f64>,
    /// Volatility of the portfolio.
    pub portfolio: f64,
}

/// Concentration metrics of `weights`.
///
/// The diversification ratio needs `vols` with a positive portfolio volatility. Sector
/// figures need a non-empty `sectors` slice aligned with `weights`; missing sectors are
/// bucketed under [`UNKNOWN_SECTOR`].
#[must_use]
pub fn compute_diversification(
    weights: &Array1<f64>,
    vols: Option<VolatilityInputs<'_>>,
    sectors: Option<&[Option<String>]>,
) -> DiversificationMetrics {
    let hhi = weights.mapv(|w| w * w).sum();
    let effective_n = if hhi > 0.0 { 1.0 / hhi } else { 0.0 };
    let max_weight = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let diversification_ratio = vols
        .filter(|v| v.portfolio > 0.0 && v.individual.len() == weights.len())
        .map(|v| round_to(weights.dot(v.individual) / v.portfolio, 4));

    let by_sector = sectors.filter(|s| !s.is_empty()).map(|sectors| {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for (w, sector) in weights.iter().zip(sectors) {
            *totals.entry(sector.as_deref().unwrap_or(UNKNOWN_SECTOR)).or_default() += w;
        }
        let mut pairs: Vec<(String, f64)> = totals.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    });
    let sector_hhi = by_sector.as_ref().map(|pairs| round_to(pairs.iter().map(|(_, w)| w * w).sum(), 6));
    let sector_concentration =
        by_sector.map(|pairs| pairs.into_iter().map(|(k, w)| (k, round_to(w, 6))).collect());

    DiversificationMetrics {
        hhi: round_to(hhi, 6),
        effective_n: round_to(effective_n, 2),
        max_weight: if weights.is_empty() { 0.0 } else { round_to(max_weight, 6) },
        holdings_count: weights.len(),
        diversification_ratio,
        sector_concentration,
        sector_hhi,
    }
}
