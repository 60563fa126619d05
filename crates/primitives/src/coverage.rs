//! Closed enums reported in analysis results.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How much of the requested history or holdings an analysis could use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataCoverage {
    /// Every input was available for the full lookback.
    Full,
    /// Usable, but with a shorter lookback or some inputs excluded.
    Partial,
    /// Too little data to produce a result.
    Insufficient,
}

impl DataCoverage {
    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Partial => "PARTIAL",
            Self::Insufficient => "INSUFFICIENT",
        }
    }
}

impl fmt::Display for DataCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk-score tier of a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    /// Score of at most 40.
    Stable,
    /// Score above 40 and at most 70.
    Caution,
    /// Score above 70.
    Warning,
    /// Not enough data to score.
    Unknown,
}

impl RiskTier {
    /// Tier for a score on the 0..=100 scale.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score <= 40.0 {
            Self::Stable
        } else if score <= 70.0 {
            Self::Caution
        } else {
            Self::Warning
        }
    }
}

/// Path generator used by a simulation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMethod {
    /// Resample historical daily return rows with replacement.
    #[default]
    Bootstrap,
    /// Correlated geometric Brownian motion.
    Gbm,
}

impl SimulationMethod {
    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Gbm => "gbm",
        }
    }
}

impl fmt::Display for SimulationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bootstrap" => Ok(Self::Bootstrap),
            "gbm" => Ok(Self::Gbm),
            other => Err(format!("method must be one of bootstrap, gbm; got {other}")),
        }
    }
}
