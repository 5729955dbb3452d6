//! Query settings and consistency policies

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Default number of parallel slots
pub const DEFAULT_MAX_PARALLEL: u16 = 5;

/// Default retry budget for rounds in which no endpoint answered
pub const DEFAULT_RETRIES: u16 = 2;

/// Default retry budget for rounds in which endpoints disagreed
pub const DEFAULT_INCONSISTENCY_RETRIES: u16 = 1;

/// Combines gathered responses into a single value for averaging policies
pub type Aggregator<R> = Arc<dyn Fn(&[R]) -> R + Send + Sync>;

/// Rule deciding when gathered responses are sufficient
pub enum ConsistencyPolicy<R> {
    /// Accept a value as soon as this many endpoints report it identically
    Count(u16),

    /// Combine responses with the aggregator as soon as this many endpoints
    /// have answered
    Average {
        /// Number of responses the aggregator needs
        required: u16,
        /// Combining function, e.g. a mean over reported fees
        aggregate: Aggregator<R>,
    },
}

impl<R> ConsistencyPolicy<R> {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Count(_) => "count",
            Self::Average { .. } => "average",
        }
    }

    /// Number of responses the policy needs before it can decide
    pub fn required(&self) -> u16 {
        match self {
            Self::Count(required) => *required,
            Self::Average { required, .. } => *required,
        }
    }
}

impl<R> Clone for ConsistencyPolicy<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Count(required) => Self::Count(*required),
            Self::Average { required, aggregate } => Self::Average {
                required: *required,
                aggregate: Arc::clone(aggregate),
            },
        }
    }
}

impl<R> fmt::Debug for ConsistencyPolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(required) => f.debug_tuple("Count").field(required).finish(),
            Self::Average { required, .. } => f
                .debug_struct("Average")
                .field("required", required)
                .finish_non_exhaustive(),
        }
    }
}

/// Immutable knobs for one query
pub struct Settings<R> {
    /// Upper bound on concurrently outstanding endpoint calls
    pub max_parallel: u16,

    /// Rule deciding when gathered responses are sufficient
    pub policy: ConsistencyPolicy<R>,

    /// Extra rounds granted when no endpoint answered at all
    pub retries: u16,

    /// Extra rounds granted when endpoints answered but disagreed
    pub retries_for_inconsistency: u16,
}

impl<R> Settings<R> {
    /// Settings requiring `required` identical responses
    pub fn count(required: u16) -> Self {
        Self::with_policy(ConsistencyPolicy::Count(required))
    }

    /// Settings averaging over `required` responses
    pub fn average(required: u16, aggregate: Aggregator<R>) -> Self {
        Self::with_policy(ConsistencyPolicy::Average { required, aggregate })
    }

    /// Settings with the given policy and default budgets
    pub fn with_policy(policy: ConsistencyPolicy<R>) -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            policy,
            retries: DEFAULT_RETRIES,
            retries_for_inconsistency: DEFAULT_INCONSISTENCY_RETRIES,
        }
    }

    /// Set the parallel slot count
    pub fn with_max_parallel(mut self, max_parallel: u16) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    /// Set the retry budget for rounds without any response
    pub fn with_retries(mut self, retries: u16) -> Self {
        self.retries = retries;
        self
    }

    /// Set the retry budget for rounds with disagreeing responses
    pub fn with_inconsistency_retries(mut self, retries: u16) -> Self {
        self.retries_for_inconsistency = retries;
        self
    }

    /// Check the preconditions for querying `endpoint_count` endpoints
    ///
    /// Runs before any endpoint is called; a violation fails the query
    /// without touching the network.
    pub fn validate(&self, endpoint_count: usize) -> std::result::Result<(), SettingsError> {
        if endpoint_count == 0 {
            return Err(SettingsError::NoEndpoints);
        }
        if self.max_parallel == 0 {
            return Err(SettingsError::ZeroParallel);
        }
        match &self.policy {
            ConsistencyPolicy::Count(required) => {
                if *required == 0 {
                    return Err(SettingsError::ZeroRequired);
                }
                if usize::from(*required) > endpoint_count {
                    return Err(SettingsError::CountExceedsEndpoints {
                        required: *required,
                        endpoints: endpoint_count,
                    });
                }
            },
            ConsistencyPolicy::Average { required, .. } => {
                if *required == 0 {
                    return Err(SettingsError::ZeroRequired);
                }
                if *required > self.max_parallel {
                    return Err(SettingsError::AverageExceedsParallel {
                        required: *required,
                        max_parallel: self.max_parallel,
                    });
                }
            },
        }
        Ok(())
    }
}

impl<R> Clone for Settings<R> {
    fn clone(&self) -> Self {
        Self {
            max_parallel: self.max_parallel,
            policy: self.policy.clone(),
            retries: self.retries,
            retries_for_inconsistency: self.retries_for_inconsistency,
        }
    }
}

impl<R> fmt::Debug for Settings<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("max_parallel", &self.max_parallel)
            .field("policy", &self.policy)
            .field("retries", &self.retries)
            .field("retries_for_inconsistency", &self.retries_for_inconsistency)
            .finish()
    }
}

/// Precondition violations detected before any endpoint call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The endpoint list was empty
    #[error("At least one endpoint is required")]
    NoEndpoints,

    /// `max_parallel` was zero
    #[error("max_parallel must be at least 1")]
    ZeroParallel,

    /// The policy required zero responses
    #[error("Required response count must be at least 1")]
    ZeroRequired,

    /// A counting policy required more responses than endpoints exist
    #[error("Cannot require {required} matching responses from {endpoints} endpoints")]
    CountExceedsEndpoints { required: u16, endpoints: usize },

    /// An averaging policy required more responses than parallel slots
    #[error("Averaging over {required} responses exceeds max_parallel {max_parallel}")]
    AverageExceedsParallel { required: u16, max_parallel: u16 },
}
