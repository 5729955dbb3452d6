//! Public query client and its retry controller

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::bucket::EndpointList;
use crate::round::{run_round, RoundOutcome};
use crate::settings::{ConsistencyPolicy, Settings};
use crate::{metrics, tally, Endpoint, QueryError, Result};

/// Cross-checking query client over equivalent RPC endpoints
///
/// `E` names the recoverable connection-error class shared by the caller's
/// endpoint adapters. Because recoverable failures travel in their own
/// [`CallError::Recoverable`](crate::CallError::Recoverable) variant, any
/// adapter bug surfaces as fatal instead of being silently retried.
///
/// The client holds no state; every [`query`](Self::query) call is an
/// independent coordinated fanout.
pub struct QuorumClient<E> {
    _recoverable: PhantomData<fn() -> E>,
}

impl<E> QuorumClient<E> {
    /// Create a query client
    pub fn new() -> Self {
        Self { _recoverable: PhantomData }
    }
}

impl<E> Default for QuorumClient<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> QuorumClient<E>
where
    E: std::error::Error + Send + 'static,
{
    /// Query every endpoint needed to satisfy the consistency policy
    ///
    /// At most `settings.max_parallel` calls are outstanding at any moment.
    /// Rounds in which nobody answered retry only the failed endpoints under
    /// the `retries` budget; rounds in which answers disagreed retry the
    /// full list under the `retries_for_inconsistency` budget. Averaging
    /// queries keep already-gathered responses across retries, counting
    /// queries must reach agreement within a single round.
    ///
    /// # Errors
    ///
    /// [`QueryError::Config`] before any endpoint call if the settings are
    /// rejected; otherwise one of [`QueryError::NoResponses`],
    /// [`QueryError::NotEnoughResponses`], [`QueryError::Inconsistent`], or
    /// [`QueryError::Fatal`].
    pub async fn query<A, R>(
        &self,
        settings: &Settings<R>,
        argument: A,
        endpoints: Vec<Arc<dyn Endpoint<A, R, E>>>,
    ) -> Result<R, E>
    where
        A: Send + Sync + 'static,
        R: Clone + Eq + Send + 'static,
    {
        if let Err(error) = settings.validate(endpoints.len()) {
            metrics::record_query("config");
            return Err(error.into());
        }

        let started = Instant::now();
        let finish = |result: &str| {
            metrics::record_query(result);
            metrics::record_query_duration(started.elapsed().as_secs_f64());
        };

        debug!(
            endpoints = endpoints.len(),
            max_parallel = settings.max_parallel,
            policy = settings.policy.kind(),
            required = settings.policy.required(),
            "Starting quorum query"
        );

        let endpoints: EndpointList<A, R, E> = Arc::new(endpoints);
        let argument = Arc::new(argument);
        let every: Vec<usize> = (0..endpoints.len()).collect();

        let mut active = every.clone();
        let mut carried: Vec<R> = Vec::new();
        let mut retries_used: u16 = 0;
        let mut inconsistency_retries_used: u16 = 0;
        let mut first_cause: Option<E> = None;

        loop {
            let seed = std::mem::take(&mut carried);
            let outcome = match run_round(&endpoints, &argument, active.clone(), seed, settings)
                .await
            {
                Ok(outcome) => outcome,
                Err(error) => {
                    finish("fatal");
                    return Err(error);
                },
            };

            let (results, failures) = match outcome {
                RoundOutcome::Consistent(value) => {
                    finish("consistent");
                    return Ok(value);
                },
                RoundOutcome::Averaged(value) => {
                    finish("averaged");
                    return Ok(value);
                },
                RoundOutcome::NotEnough { results, failures } => (results, failures),
            };

            let failed = declaration_order(&failures);
            if first_cause.is_none() {
                first_cause = failures.into_iter().next().map(|(_, error)| error);
            }

            if results.is_empty() {
                // Nobody answered this round
                if retries_used == settings.retries {
                    finish("no_responses");
                    return Err(QueryError::NoResponses { first_cause });
                }
                retries_used += 1;
                metrics::record_retry_round("no_responses");
                warn!(
                    failed = failed.len(),
                    retries_used,
                    budget = settings.retries,
                    "No endpoint answered, retrying failed endpoints"
                );
                active = failed;
                continue;
            }

            match &settings.policy {
                ConsistencyPolicy::Count(required) => {
                    let agreeing = tally::top_count(&results);
                    if inconsistency_retries_used == settings.retries_for_inconsistency {
                        finish("inconsistent");
                        return Err(QueryError::Inconsistent {
                            responses: results.len(),
                            agreeing,
                            required: *required,
                        });
                    }
                    inconsistency_retries_used += 1;
                    metrics::record_retry_round("inconsistency");
                    warn!(
                        responses = results.len(),
                        agreeing,
                        required = *required,
                        inconsistency_retries_used,
                        "Endpoints disagree, retrying the full endpoint list"
                    );
                    // Agreement must be reached fresh; gathered responses
                    // are discarded and every endpoint is asked again
                    active = every.clone();
                },
                ConsistencyPolicy::Average { required, .. } => {
                    if retries_used == settings.retries {
                        finish("not_enough");
                        return Err(QueryError::NotEnoughResponses {
                            gathered: results.len(),
                            required: *required,
                            first_cause,
                        });
                    }
                    retries_used += 1;
                    metrics::record_retry_round("not_enough");
                    debug!(
                        gathered = results.len(),
                        required = *required,
                        retries_used,
                        "Keeping gathered responses, retrying failed endpoints"
                    );
                    // Responses already gathered still count toward the
                    // average; only the failed endpoints are asked again
                    active = failed;
                    carried = results;
                },
            }
        }
    }
}

/// Indices of failed endpoints, restored to declaration order
fn declaration_order<E>(failures: &[(usize, E)]) -> Vec<usize> {
    let mut failed: Vec<usize> = failures.iter().map(|(index, _)| *index).collect();
    failed.sort_unstable();
    failed
}
