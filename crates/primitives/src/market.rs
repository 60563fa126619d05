//! Market, benchmark and country enums.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Listing market. Factor models are estimated per market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Market {
    /// Korea Composite Stock Price Index constituents.
    KrKospi,
    /// KOSDAQ listings.
    KrKosdaq,
    /// New York Stock Exchange listings.
    UsNyse,
    /// Nasdaq listings.
    UsNasdaq,
}

impl Market {
    /// All markets in pipeline order.
    pub const ALL: [Self; 4] = [Self::KrKospi, Self::KrKosdaq, Self::UsNyse, Self::UsNasdaq];

    /// Stable identifier used in persisted rows.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KrKospi => "KR_KOSPI",
            Self::KrKosdaq => "KR_KOSDAQ",
            Self::UsNyse => "US_NYSE",
            Self::UsNasdaq => "US_NASDAQ",
        }
    }

    /// Country whose risk-free rate applies.
    #[must_use]
    pub const fn country(&self) -> Country {
        match self {
            Self::KrKospi | Self::KrKosdaq => Country::Kr,
            Self::UsNyse | Self::UsNasdaq => Country::Us,
        }
    }

    /// Benchmark index the market is compared against.
    #[must_use]
    pub const fn benchmark(&self) -> Benchmark {
        match self {
            Self::KrKospi => Benchmark::KrKospi,
            Self::KrKosdaq => Benchmark::KrKosdaq,
            Self::UsNyse => Benchmark::UsSp500,
            Self::UsNasdaq => Benchmark::UsNasdaq,
        }
    }

    /// Market group (region) the market belongs to.
    #[must_use]
    pub const fn group(&self) -> MarketGroup {
        match self {
            Self::KrKospi | Self::KrKosdaq => MarketGroup::Kr,
            Self::UsNyse | Self::UsNasdaq => MarketGroup::Us,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown market: {s}"))
    }
}

/// Regional grouping of markets; portfolios are tagged with one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketGroup {
    /// Korean markets.
    Kr,
    /// United States markets.
    Us,
}

impl MarketGroup {
    /// Markets that belong to the group.
    #[must_use]
    pub const fn markets(&self) -> [Market; 2] {
        match self {
            Self::Kr => [Market::KrKospi, Market::KrKosdaq],
            Self::Us => [Market::UsNyse, Market::UsNasdaq],
        }
    }

    /// Benchmark used for portfolio risk scoring.
    #[must_use]
    pub const fn benchmark(&self) -> Benchmark {
        match self {
            Self::Kr => Benchmark::KrKospi,
            Self::Us => Benchmark::UsSp500,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kr => "KR",
            Self::Us => "US",
        }
    }
}

impl fmt::Display for MarketGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Benchmark index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Benchmark {
    /// KOSPI composite.
    KrKospi,
    /// KOSDAQ composite.
    KrKosdaq,
    /// S&P 500.
    UsSp500,
    /// Nasdaq composite.
    UsNasdaq,
}

impl Benchmark {
    /// Human-readable index name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::KrKospi => "KOSPI",
            Self::KrKosdaq => "KOSDAQ",
            Self::UsSp500 => "S&P 500",
            Self::UsNasdaq => "NASDAQ",
        }
    }
}

/// Country, used to look up risk-free rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Country {
    /// South Korea.
    Kr,
    /// United States.
    Us,
}
