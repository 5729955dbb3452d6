//! File-level configuration for quorum queries

use serde::{Deserialize, Serialize};

use crate::settings::{
    Aggregator, ConsistencyPolicy, Settings, DEFAULT_INCONSISTENCY_RETRIES, DEFAULT_MAX_PARALLEL,
    DEFAULT_RETRIES,
};

/// Consistency policy as it appears in a configuration file
///
/// The aggregator for an averaging policy is code, not data; it is supplied
/// when the configuration is turned into [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum PolicyConfig {
    /// Accept a value once this many endpoints report it identically
    Count {
        #[serde(default = "default_required")]
        required: u16,
    },

    /// Combine responses once this many endpoints have answered
    Average {
        #[serde(default = "default_required")]
        required: u16,
    },
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::Count { required: default_required() }
    }
}

/// Quorum query configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// Upper bound on concurrently outstanding endpoint calls
    #[serde(default = "default_max_parallel")]
    pub max_parallel: u16,

    /// Consistency policy
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Extra rounds granted when no endpoint answered at all
    #[serde(default = "default_retries")]
    pub retries: u16,

    /// Extra rounds granted when endpoints answered but disagreed
    #[serde(default = "default_inconsistency_retries")]
    pub retries_for_inconsistency: u16,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            policy: PolicyConfig::default(),
            retries: default_retries(),
            retries_for_inconsistency: default_inconsistency_retries(),
        }
    }
}

impl QuorumConfig {
    /// Build runtime settings from this configuration
    ///
    /// `aggregate` is consulted only for an averaging policy.
    pub fn into_settings<R>(self, aggregate: impl FnOnce() -> Aggregator<R>) -> Settings<R> {
        let policy = match self.policy {
            PolicyConfig::Count { required } => ConsistencyPolicy::Count(required),
            PolicyConfig::Average { required } => {
                ConsistencyPolicy::Average { required, aggregate: aggregate() }
            },
        };

        Settings {
            max_parallel: self.max_parallel,
            policy,
            retries: self.retries,
            retries_for_inconsistency: self.retries_for_inconsistency,
        }
    }
}

fn default_max_parallel() -> u16 {
    DEFAULT_MAX_PARALLEL
}

fn default_required() -> u16 {
    2
}

fn default_retries() -> u16 {
    DEFAULT_RETRIES
}

fn default_inconsistency_retries() -> u16 {
    DEFAULT_INCONSISTENCY_RETRIES
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_config_default() {
        let config = QuorumConfig::default();
        assert_eq!(config.max_parallel, DEFAULT_MAX_PARALLEL);
        assert_eq!(config.policy, PolicyConfig::Count { required: 2 });
        assert_eq!(config.retries, DEFAULT_RETRIES);
        assert_eq!(config.retries_for_inconsistency, DEFAULT_INCONSISTENCY_RETRIES);
    }

    #[test]
    fn test_policy_serialization() {
        // Tagged enum serializes with "type" field
        let policy = PolicyConfig::Count { required: 3 };
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("\"type\":\"count\""));

        let policy = PolicyConfig::Average { required: 4 };
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("\"type\":\"average\""));
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let config = QuorumConfig {
            max_parallel: 8,
            policy: PolicyConfig::Average { required: 4 },
            retries: 3,
            retries_for_inconsistency: 0,
        };

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("average"));
        assert!(yaml.contains("max_parallel: 8"));

        let parsed: QuorumConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let yaml = r#"
policy:
  type: count
  required: 3
"#;
        let config: QuorumConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.policy, PolicyConfig::Count { required: 3 });
        assert_eq!(config.max_parallel, DEFAULT_MAX_PARALLEL);
        assert_eq!(config.retries, DEFAULT_RETRIES);
    }

    #[test]
    fn test_into_settings_count() {
        let config = QuorumConfig {
            max_parallel: 4,
            policy: PolicyConfig::Count { required: 2 },
            retries: 1,
            retries_for_inconsistency: 1,
        };

        let settings: Settings<u64> = config.into_settings(|| Arc::new(|_: &[u64]| 0));
        assert_eq!(settings.max_parallel, 4);
        assert_eq!(settings.policy.kind(), "count");
        assert_eq!(settings.policy.required(), 2);
    }

    #[test]
    fn test_into_settings_average_uses_supplied_aggregator() {
        let config = QuorumConfig {
            max_parallel: 4,
            policy: PolicyConfig::Average { required: 2 },
            retries: 1,
            retries_for_inconsistency: 1,
        };

        let settings: Settings<u64> =
            config.into_settings(|| Arc::new(|values: &[u64]| values.iter().sum()));
        match &settings.policy {
            ConsistencyPolicy::Average { required, aggregate } => {
                assert_eq!(*required, 2);
                assert_eq!(aggregate(&[10, 30]), 40);
            },
            ConsistencyPolicy::Count(_) => panic!("Expected an averaging policy"),
        }
    }
}
