//! Result sections that can be individually unavailable.

use std::fmt;

use serde::Serialize;

/// Why a section of an analysis has no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Unavailable {
    /// The portfolio has no holdings.
    #[serde(rename = "No holdings")]
    NoHoldings,
    /// Holdings share too little price history.
    #[serde(rename = "Insufficient data")]
    InsufficientData,
    /// Too little price history for a risk decomposition.
    #[serde(rename = "Insufficient data for risk decomposition")]
    InsufficientDecompositionData,
    /// The return covariance could not be built.
    #[serde(rename = "Cannot build returns matrix")]
    ReturnsMatrix,
    /// Too few benchmark closes.
    #[serde(rename = "Benchmark data unavailable")]
    BenchmarkUnavailable,
    /// Benchmark closes barely overlap the holdings' dates.
    #[serde(rename = "Insufficient benchmark overlap")]
    BenchmarkOverlap,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoHoldings => "No holdings",
            Self::InsufficientData => "Insufficient data",
            Self::InsufficientDecompositionData => "Insufficient data for risk decomposition",
            Self::ReturnsMatrix => "Cannot build returns matrix",
            Self::BenchmarkUnavailable => "Benchmark data unavailable",
            Self::BenchmarkOverlap => "Insufficient benchmark overlap",
        })
    }
}

/// One section of an analysis: a result, or the reason there is none.
///
/// Serialises as the result itself or as `{"error": reason}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    /// The section was computed.
    Ready(T),
    /// The section could not be computed.
    Unavailable {
        /// Reason.
        error: Unavailable,
    },
}

impl<T> Section<T> {
    /// Section that could not be computed.
    #[must_use]
    pub const fn unavailable(error: Unavailable) -> Self {
        Self::Unavailable { error }
    }

    /// The result, if computed.
    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    /// The reason, if not computed.
    #[must_use]
    pub const fn error(&self) -> Option<Unavailable> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable { error } => Some(*error),
        }
    }
}

impl<T> From<Result<T, Unavailable>> for Section<T> {
    fn from(result: Result<T, Unavailable>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(error) => Self::Unavailable { error },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_serialises_as_error_object() {
        let section: Section<u32> = Section::unavailable(Unavailable::BenchmarkOverlap);
        assert_eq!(serde_json::to_string(&section).unwrap(), r#"{"error":"Insufficient benchmark overlap"}"#);
        assert_eq!(section.error().map(|e| e.to_string()).as_deref(), Some("Insufficient benchmark overlap"));
    }

    #[test]
    fn ready_serialises_transparently() {
        let section: Section<u32> = Ok(7).into();
        assert_eq!(serde_json::to_string(&section).unwrap(), "7");
        assert_eq!(section.ready(), Some(&7));
    }
}
