//! Error types for quorum queries

use thiserror::Error;

use crate::settings::SettingsError;

/// Boxed cause for non-recoverable endpoint failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for quorum query operations
pub type Result<T, E> = std::result::Result<T, QueryError<E>>;

/// Errors raised by [`QuorumClient::query`](crate::QuorumClient::query)
///
/// Exactly one of these is returned per failed query; partial results are
/// discarded. `first_cause` fields carry the first recoverable error
/// observed, in time order, across every retry round.
#[derive(Debug, Error)]
pub enum QueryError<E>
where
    E: std::error::Error + 'static,
{
    /// Settings or the endpoint list were rejected before any call was made
    #[error("Configuration rejected: {0}")]
    Config(#[from] SettingsError),

    /// Every endpoint failed with a recoverable error, across all retries
    #[error("No endpoint returned a response")]
    NoResponses {
        #[source]
        first_cause: Option<E>,
    },

    /// An averaging query gathered responses, but fewer than required
    #[error("Only {gathered} of {required} responses were gathered")]
    NotEnoughResponses {
        gathered: usize,
        required: u16,
        #[source]
        first_cause: Option<E>,
    },

    /// Responses were gathered but no value was reported by enough endpoints
    #[error("Inconsistent responses: {responses} gathered, best agreement {agreeing}, required {required}")]
    Inconsistent {
        responses: usize,
        agreeing: usize,
        required: u16,
    },

    /// A non-recoverable endpoint failure, surfaced with its original cause
    #[error("Endpoint failed fatally: {0}")]
    Fatal(BoxError),
}

impl<E> QueryError<E>
where
    E: std::error::Error + 'static,
{
    /// Create a fatal query error from any underlying cause
    pub fn fatal(error: impl Into<BoxError>) -> Self {
        Self::Fatal(error.into())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("peer {0} hung up")]
    struct HungUp(&'static str);

    #[test]
    fn test_inconsistent_message_carries_all_three_numbers() {
        let error: QueryError<HungUp> =
            QueryError::Inconsistent { responses: 6, agreeing: 1, required: 2 };
        let message = error.to_string();
        assert!(message.contains('6'));
        assert!(message.contains('1'));
        assert!(message.contains('2'));
    }

    #[test]
    fn test_no_responses_exposes_first_cause_as_source() {
        let error: QueryError<HungUp> =
            QueryError::NoResponses { first_cause: Some(HungUp("node-a")) };
        let source = error.source().expect("source should be attached");
        assert_eq!(source.to_string(), "peer node-a hung up");
    }

    #[test]
    fn test_not_enough_without_cause_has_no_source() {
        let error: QueryError<HungUp> =
            QueryError::NotEnoughResponses { gathered: 1, required: 2, first_cause: None };
        assert!(error.source().is_none());
        assert_eq!(error.to_string(), "Only 1 of 2 responses were gathered");
    }

    #[test]
    fn test_settings_error_converts_to_config() {
        let error: QueryError<HungUp> = SettingsError::NoEndpoints.into();
        assert!(matches!(error, QueryError::Config(SettingsError::NoEndpoints)));
        assert!(error.to_string().contains("Configuration rejected"));
    }

    #[test]
    fn test_fatal_keeps_original_message() {
        let error: QueryError<HungUp> = QueryError::fatal("unexpected script reply");
        assert!(error.to_string().contains("unexpected script reply"));
    }
}
