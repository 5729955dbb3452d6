//! # Tessera Quorum - Fault-Tolerant Parallel Queries
//!
//! Runs a single request against several equivalent blockchain RPC endpoints
//! at once and reconciles their answers under a consistency policy, so that
//! no single endpoint has to be trusted.
//!
//! The endpoint list is split into contiguous buckets, one per parallel
//! slot. Buckets run concurrently; inside a bucket, endpoints are tried one
//! at a time in declaration order, so a failing endpoint is replaced by its
//! bucket neighbour without exceeding the parallel budget. As responses
//! arrive, the [`ConsistencyPolicy`] decides whether enough of them agree
//! (or can be averaged) to produce a final value. If every bucket drains
//! without a decision, the query is retried under per-failure-class budgets:
//! "nobody answered" and "answers disagree" each have their own counter.
//!
//! Endpoints signal transient connection trouble with
//! [`CallError::Recoverable`]; those failures are recorded and routed around.
//! Any other failure is a [`CallError::Fatal`] and aborts the whole query
//! immediately, surfacing the original cause.

use async_trait::async_trait;

pub mod config;
pub mod error;
pub mod metrics;
pub mod settings;

mod bucket;
mod client;
mod round;
mod tally;

pub use client::QuorumClient;
pub use config::{PolicyConfig, QuorumConfig};
pub use error::{BoxError, QueryError, Result};
pub use settings::{Aggregator, ConsistencyPolicy, Settings, SettingsError};

/// Outcome of a single endpoint call.
pub type CallResult<R, E> = std::result::Result<R, CallError<E>>;

/// Failure modes of a single endpoint call.
///
/// The recoverable class is a caller-chosen type, named per wallet backend,
/// so that a bug in an adapter can never masquerade as connection trouble.
#[derive(Debug)]
pub enum CallError<E> {
    /// A transient connection problem. The coordinator records it and moves
    /// on to the next endpoint in the bucket.
    Recoverable(E),

    /// Anything else. Propagated as-is, aborting the whole query.
    Fatal(BoxError),
}

impl<E> CallError<E> {
    /// Create a recoverable call error
    pub fn recoverable(error: E) -> Self {
        Self::Recoverable(error)
    }

    /// Create a fatal call error from any underlying cause
    pub fn fatal(error: impl Into<BoxError>) -> Self {
        Self::Fatal(error.into())
    }
}

/// A single queryable server: computes a response from the request argument.
///
/// Implementations wrap one RPC endpoint (an HTTP or JSON-RPC client with
/// its own timeouts). The coordinator may invoke an endpoint again on a
/// retry round, so implementations should treat calls as at-least-once.
#[async_trait]
pub trait Endpoint<A, R, E>: Send + Sync {
    /// Compute a response for `argument`
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Recoverable`] for transient connection problems
    /// and [`CallError::Fatal`] for everything else.
    async fn call(&self, argument: &A) -> CallResult<R, E>;
}

#[async_trait]
impl<A, R, E, F> Endpoint<A, R, E> for F
where
    A: Sync,
    R: Send,
    E: Send,
    F: Fn(&A) -> CallResult<R, E> + Send + Sync,
{
    async fn call(&self, argument: &A) -> CallResult<R, E> {
        (self)(argument)
    }
}
