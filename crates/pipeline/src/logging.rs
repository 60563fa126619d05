//! Logging configuration using tracing.

use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::PipelineError;

/// Logging format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format for log aggregation.
    Json,
    /// Compact format.
    Compact,
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `default_level`; the dataframe engine is capped at `warn`.
///
/// # Errors
/// Returns `PipelineError::Logging` if a global subscriber is already installed.
pub fn init_logging(format: LogFormat, default_level: Level) -> Result<(), PipelineError> {
    let directive = "polars=warn".parse::<Directive>().map_err(|e| PipelineError::Logging(format!("{e}")))?;
    let env_filter =
        EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy().add_directive(directive);

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false).with_span_events(FmtSpan::CLOSE))
            .try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_span_events(FmtSpan::CLOSE)).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact().with_target(false)).try_init(),
    };
    installed.map_err(|e| PipelineError::Logging(e.to_string()))
}

/// Install the pretty subscriber at `INFO`.
///
/// # Errors
/// Returns `PipelineError::Logging` if a global subscriber is already installed.
pub fn init_default_logging() -> Result<(), PipelineError> {
    init_logging(LogFormat::Pretty, Level::INFO)
}
