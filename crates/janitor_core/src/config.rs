use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::retention::DEFAULT_VERSIONS_TO_KEEP;
use crate::retry::RetryPlan;

pub const FUNCTION_PREFIX_KEY: &str = "LAMBDA_ARN_PREFIX";
pub const LAYER_PREFIX_KEY: &str = "LAYER_ARN_PREFIX";
pub const VERSIONS_TO_KEEP_KEY: &str = "VERSIONS_TO_KEEP";
pub const RETRIES_KEY: &str = "RETRIES";
pub const RETRY_MIN_TIMEOUT_KEY: &str = "RETRY_MIN_TIMEOUT";
pub const RETRY_MAX_TIMEOUT_KEY: &str = "RETRY_MAX_TIMEOUT";

/// Runtime knobs for one cleanup run, resolved from environment-style
/// key/value pairs.
///
/// An unset or empty prefix disables that side of the cleanup. Malformed
/// numeric values fall back to their defaults rather than failing the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JanitorConfig {
    pub function_prefix: Option<String>,
    pub layer_prefix: Option<String>,
    pub versions_to_keep: usize,
    pub retry: RetryPlan,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            function_prefix: None,
            layer_prefix: None,
            versions_to_keep: DEFAULT_VERSIONS_TO_KEEP,
            retry: RetryPlan::default(),
        }
    }
}

impl JanitorConfig {
    pub fn from_env_map(env: &HashMap<String, String>) -> Self {
        let defaults = RetryPlan::default();
        Self {
            function_prefix: non_empty(env, FUNCTION_PREFIX_KEY),
            layer_prefix: non_empty(env, LAYER_PREFIX_KEY),
            versions_to_keep: parse_or(env, VERSIONS_TO_KEEP_KEY, DEFAULT_VERSIONS_TO_KEEP),
            retry: RetryPlan {
                max_attempts: parse_or(env, RETRIES_KEY, defaults.max_attempts),
                min_backoff: Duration::from_millis(parse_or(
                    env,
                    RETRY_MIN_TIMEOUT_KEY,
                    defaults.min_backoff.as_millis() as u64,
                )),
                max_backoff: Duration::from_millis(parse_or(
                    env,
                    RETRY_MAX_TIMEOUT_KEY,
                    defaults.max_backoff.as_millis() as u64,
                )),
            },
        }
    }
}

fn non_empty(env: &HashMap<String, String>, key: &str) -> Option<String> {
    env.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_or<T: FromStr + Copy>(env: &HashMap<String, String>, key: &str, default: T) -> T {
    env.get(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_disables_both_cleanups() {
        let config = JanitorConfig::from_env_map(&HashMap::new());
        assert_eq!(config, JanitorConfig::default());
        assert!(config.function_prefix.is_none());
        assert!(config.layer_prefix.is_none());
    }

    #[test]
    fn blank_prefix_counts_as_unset() {
        let config = JanitorConfig::from_env_map(&env(&[(FUNCTION_PREFIX_KEY, "   ")]));
        assert!(config.function_prefix.is_none());
    }

    #[test]
    fn prefixes_enable_their_cleanup_side() {
        let config = JanitorConfig::from_env_map(&env(&[
            (FUNCTION_PREFIX_KEY, "service-prod"),
            (LAYER_PREFIX_KEY, "shared-"),
        ]));
        assert_eq!(config.function_prefix.as_deref(), Some("service-prod"));
        assert_eq!(config.layer_prefix.as_deref(), Some("shared-"));
    }

    #[test]
    fn numeric_overrides_are_applied() {
        let config = JanitorConfig::from_env_map(&env(&[
            (VERSIONS_TO_KEEP_KEY, "7"),
            (RETRIES_KEY, "2"),
            (RETRY_MIN_TIMEOUT_KEY, "100"),
            (RETRY_MAX_TIMEOUT_KEY, "400"),
        ]));
        assert_eq!(config.versions_to_keep, 7);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.min_backoff, Duration::from_millis(100));
        assert_eq!(config.retry.max_backoff, Duration::from_millis(400));
    }

    #[test]
    fn malformed_numerics_fall_back_to_defaults() {
        let config = JanitorConfig::from_env_map(&env(&[
            (VERSIONS_TO_KEEP_KEY, "many"),
            (RETRIES_KEY, "-1"),
            (RETRY_MIN_TIMEOUT_KEY, ""),
        ]));
        assert_eq!(config.versions_to_keep, DEFAULT_VERSIONS_TO_KEEP);
        assert_eq!(config.retry, RetryPlan::default());
    }
}
