//! Serial buckets of endpoints and their fair partition

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::error::BoxError;
use crate::{metrics, CallError, Endpoint};

/// Endpoint list shared between buckets for the duration of one query
pub(crate) type EndpointList<A, R, E> = Arc<Vec<Arc<dyn Endpoint<A, R, E>>>>;

/// What a bucket produced when it was last driven
pub(crate) enum BucketOutcome<A, R, E> {
    /// The first pending endpoint answered. The remainder of the bucket is
    /// handed back as `rest` and runs only if it is driven again.
    FirstSuccess {
        value: R,
        failures: Vec<(usize, E)>,
        rest: Bucket<A, R, E>,
    },

    /// Every pending endpoint failed recoverably
    Exhausted { failures: Vec<(usize, E)> },
}

/// One parallel slot's contiguous share of the endpoint list
///
/// A bucket owns its pending endpoints exclusively until it is exhausted;
/// the indices refer into the shared declaration-ordered list.
pub(crate) struct Bucket<A, R, E> {
    endpoints: EndpointList<A, R, E>,
    argument: Arc<A>,
    pending: VecDeque<usize>,
}

impl<A, R, E> Bucket<A, R, E>
where
    A: Send + Sync + 'static,
    R: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    pub(crate) fn new(
        endpoints: EndpointList<A, R, E>,
        argument: Arc<A>,
        pending: Vec<usize>,
    ) -> Self {
        Self { endpoints, argument, pending: pending.into() }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Try pending endpoints one at a time, in declaration order
    ///
    /// Stops at the first success so that the remaining endpoints are only
    /// consulted if the gathered responses turn out to be insufficient. A
    /// fatal error aborts immediately and is surfaced unchanged.
    pub(crate) async fn drive(mut self) -> std::result::Result<BucketOutcome<A, R, E>, BoxError> {
        let mut failures = Vec::new();
        while let Some(index) = self.pending.pop_front() {
            let endpoint = Arc::clone(&self.endpoints[index]);
            match endpoint.call(&self.argument).await {
                Ok(value) => {
                    metrics::record_endpoint_call("ok");
                    return Ok(BucketOutcome::FirstSuccess { value, failures, rest: self });
                },
                Err(CallError::Recoverable(error)) => {
                    metrics::record_endpoint_call("recoverable");
                    debug!(
                        endpoint = index,
                        error = %error,
                        "Endpoint failed, trying next in bucket"
                    );
                    failures.push((index, error));
                },
                Err(CallError::Fatal(error)) => {
                    metrics::record_endpoint_call("fatal");
                    return Err(error);
                },
            }
        }
        Ok(BucketOutcome::Exhausted { failures })
    }
}

/// Split `items` into exactly `slots` contiguous runs of near-equal length
///
/// The first `len % slots` runs hold one extra item; trailing runs may be
/// empty when there are fewer items than slots.
pub(crate) fn partition<T>(items: Vec<T>, slots: usize) -> Vec<Vec<T>> {
    let total = items.len();
    let base = total / slots;
    let extra = total % slots;

    let mut buckets = Vec::with_capacity(slots);
    let mut remaining = items.into_iter();
    for slot in 0..slots {
        let take = base + usize::from(slot < extra);
        buckets.push(remaining.by_ref().take(take).collect());
    }

    assert_eq!(buckets.len(), slots, "fair split must fill every parallel slot");
    buckets
}
