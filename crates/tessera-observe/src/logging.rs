//! Structured logging for the Tessera wallet
//!
//! Wallet processes run in two very different places: an interactive
//! session driving a terminal, and an unattended daemon refreshing
//! balances in the background. The log profile picks an output shape and
//! default verbosity for each, and the helpers attach quorum-query
//! context to events and spans.

use tracing::Span;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Where the wallet process is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogProfile {
    /// Interactive wallet session: compact untimed lines, quiet
    /// dependencies, no span noise on the terminal
    #[default]
    Interactive,

    /// Unattended wallet daemon: JSON lines with span close events so
    /// query rounds can be traced after the fact
    Daemon,

    /// Development: pretty output with source locations and full span
    /// lifecycle events
    Verbose,
}

/// Configuration for logging behavior
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Output profile
    pub profile: LogProfile,

    /// Raise quorum coordination logs to debug so every bucket launch,
    /// endpoint failure, and retry round is visible
    pub trace_queries: bool,

    /// Explicit filter overriding the profile defaults
    /// (e.g. "warn,tessera_quorum=trace")
    pub filter: Option<String>,
}

impl LogConfig {
    /// Configuration for an unattended wallet daemon
    pub fn daemon() -> Self {
        Self { profile: LogProfile::Daemon, ..Self::default() }
    }

    /// Follow every query round at debug level
    pub fn with_query_tracing(mut self) -> Self {
        self.trace_queries = true;
        self
    }
}

/// Initialize logging for the configured profile
pub fn init_logging(config: LogConfig) -> anyhow::Result<()> {
    let filter = build_filter(&config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let initialized = match config.profile {
        LogProfile::Interactive => {
            builder.compact().with_target(false).without_time().try_init()
        },
        LogProfile::Daemon => builder
            .json()
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init(),
        LogProfile::Verbose => builder
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .try_init(),
    };
    initialized.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!(profile = ?config.profile, "Logging initialized");

    Ok(())
}

/// Resolve the filter: an explicit string wins, then the environment,
/// then the profile defaults plus the query-tracing directive
fn build_filter(config: &LogConfig) -> anyhow::Result<EnvFilter> {
    if let Some(filter) = &config.filter {
        return Ok(EnvFilter::try_new(filter)?);
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let base = match config.profile {
        LogProfile::Interactive => "warn,tessera=info",
        LogProfile::Daemon => "info",
        LogProfile::Verbose => "debug",
    };
    let mut filter = EnvFilter::new(base);
    if config.trace_queries {
        filter = filter.add_directive("tessera_quorum=debug".parse()?);
    }
    Ok(filter)
}

/// Helper to create a span for one quorum query
pub fn query_span(policy: &str, endpoints: usize) -> Span {
    tracing::info_span!(
        "quorum_query",
        policy = policy,
        endpoints = endpoints,
        result = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Helper to create a span for one endpoint call
pub fn endpoint_span(endpoint: usize) -> Span {
    tracing::debug_span!(
        "endpoint_call",
        endpoint = endpoint,
        duration_ms = tracing::field::Empty,
    )
}

/// Record the outcome of a quorum query
pub fn record_query_outcome(span: &Span, result: &str, duration_ms: u128) {
    span.record("result", result);
    span.record("duration_ms", duration_ms);
}

/// Record the duration of an endpoint call
pub fn record_endpoint_duration(span: &Span, duration_ms: u128) {
    span.record("duration_ms", duration_ms);
}

/// Warn when an endpoint answered slower than its expected ceiling
///
/// A consistently slow endpoint drags out whole buckets, so wallets
/// watch for this even when the call eventually succeeded.
pub fn log_slow_endpoint(endpoint: &str, duration_ms: u128, threshold_ms: u128) {
    if duration_ms > threshold_ms {
        tracing::warn!(
            endpoint = endpoint,
            duration_ms = duration_ms,
            threshold_ms = threshold_ms,
            "Slow endpoint response"
        );
    }
}

/// Log a failed endpoint call with its retry context
pub fn log_endpoint_failure(error: &dyn std::error::Error, endpoint: &str, round: u16) {
    tracing::warn!(
        error = %error,
        endpoint = endpoint,
        round = round,
        "Endpoint call failed"
    );
}
