//! One attempt round: parallel buckets folded through a completion loop

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::bucket::{partition, Bucket, BucketOutcome, EndpointList};
use crate::error::BoxError;
use crate::settings::{ConsistencyPolicy, Settings};
use crate::{tally, QueryError};

/// How one full fanout over the active endpoints ended
pub(crate) enum RoundOutcome<R, E> {
    /// Enough endpoints reported the same value
    Consistent(R),

    /// Enough endpoints answered and their responses were combined
    Averaged(R),

    /// Every bucket drained without satisfying the policy
    NotEnough {
        results: Vec<R>,
        failures: Vec<(usize, E)>,
    },
}

/// Launch one bucket per parallel slot and fold completions until the
/// policy is satisfied or every bucket is exhausted
///
/// `active` holds declaration-ordered indices into `endpoints`;
/// `seed_results` carries responses kept from earlier rounds. Results are
/// appended in completion order, failures in completion-bucket order with
/// declaration order inside each bucket.
pub(crate) async fn run_round<A, R, E>(
    endpoints: &EndpointList<A, R, E>,
    argument: &Arc<A>,
    active: Vec<usize>,
    seed_results: Vec<R>,
    settings: &Settings<R>,
) -> std::result::Result<RoundOutcome<R, E>, QueryError<E>>
where
    A: Send + Sync + 'static,
    R: Clone + Eq + Send + 'static,
    E: std::error::Error + Send + 'static,
{
    let mut results = seed_results;
    let mut failures: Vec<(usize, E)> = Vec::new();

    let mut in_flight: JoinSet<std::result::Result<BucketOutcome<A, R, E>, BoxError>> =
        JoinSet::new();
    for pending in partition(active, usize::from(settings.max_parallel)) {
        // An empty bucket is exhausted before it starts
        if pending.is_empty() {
            continue;
        }
        let bucket = Bucket::new(Arc::clone(endpoints), Arc::clone(argument), pending);
        in_flight.spawn(bucket.drive());
    }
    debug!(buckets = in_flight.len(), carried = results.len(), "Fanout launched");

    while let Some(joined) = in_flight.join_next().await {
        let outcome = match joined {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(fatal)) => {
                // Cancellation is best-effort; aborted buckets are not drained
                in_flight.abort_all();
                return Err(QueryError::Fatal(fatal));
            },
            Err(join_error) => {
                in_flight.abort_all();
                return Err(QueryError::fatal(join_error));
            },
        };

        match outcome {
            BucketOutcome::Exhausted { failures: bucket_failures } => {
                failures.extend(bucket_failures);
            },
            BucketOutcome::FirstSuccess { value, failures: bucket_failures, rest } => {
                failures.extend(bucket_failures);
                results.push(value);
                // The rest of the bucket stays available in case this
                // result set turns out to be insufficient
                if !rest.is_empty() {
                    in_flight.spawn(rest.drive());
                }
            },
        }

        if let Some(decided) = evaluate_policy(&settings.policy, &results) {
            in_flight.abort_all();
            return Ok(decided);
        }
    }

    debug!(
        results = results.len(),
        failures = failures.len(),
        "Fanout exhausted without a decision"
    );
    Ok(RoundOutcome::NotEnough { results, failures })
}

fn evaluate_policy<R, E>(
    policy: &ConsistencyPolicy<R>,
    results: &[R],
) -> Option<RoundOutcome<R, E>>
where
    R: Clone + Eq,
{
    match policy {
        ConsistencyPolicy::Count(required) => {
            tally::agreed(results, *required).map(RoundOutcome::Consistent)
        },
        ConsistencyPolicy::Average { required, aggregate } => {
            (results.len() >= usize::from(*required))
                .then(|| RoundOutcome::Averaged(aggregate(results)))
        },
    }
}
