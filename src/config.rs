//! Configuration for decomposition runs.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::estimator::ForestParams;

/// Configuration options for [`FairnessCookbook`](crate::FairnessCookbook).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Decomposition method (default: causal forest).
    pub method: Method,

    /// Outer bootstrap repetitions, i.e. how many times the estimator is refit
    /// (default: 1). Replicate 0 always runs on the original rows.
    pub nboot1: usize,

    /// Inner bootstrap repetitions drawn over the fitted predictions
    /// (default: 100).
    pub nboot2: usize,

    /// Expand categorical mediators and confounders into indicator columns
    /// (default: true).
    pub auto_dummy: bool,

    /// Optional deterministic base seed for all resampling and fitting.
    pub seed: Option<u64>,

    /// What to do when one outer replicate fails (default: skip it).
    pub failure_policy: FailurePolicy,

    /// Settings forwarded unchanged to the effect estimator.
    pub forest: ForestParams,
}

/// Decomposition method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Heterogeneous-effect estimator over mediator/confounder features.
    CausalForest,
    /// Mediation analysis with double machine learning. Not implemented.
    MedDml,
}

/// Handling of failed outer replicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure, exclude the replicate, keep going.
    /// Replicates already running are allowed to finish.
    #[default]
    SkipReplicate,

    /// Abort the whole run on the first failure.
    /// Replicates not yet started are cancelled.
    FailFast,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: Method::CausalForest,
            nboot1: 1,
            nboot2: 100,
            auto_dummy: true,
            seed: None,
            failure_policy: FailurePolicy::SkipReplicate,
            forest: ForestParams::default(),
        }
    }
}

impl Config {
    /// Defaults overlaid with environment variables.
    ///
    /// Reads `FC_NBOOT1`, `FC_NBOOT2`, `FC_SEED`, `FC_AUTO_DUMMY`
    /// (`1`/`true`/`0`/`false`) and `FC_FAILURE_POLICY` (`skip`/`fail_fast`).
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Overlay environment variables onto this configuration.
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| env::var(key).ok())
    }

    /// Overlay `FC_*` values produced by `lookup`.
    fn merge_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(n) = lookup("FC_NBOOT1").and_then(|v| v.trim().parse::<usize>().ok()) {
            self.nboot1 = n;
        }
        if let Some(n) = lookup("FC_NBOOT2").and_then(|v| v.trim().parse::<usize>().ok()) {
            self.nboot2 = n;
        }
        if let Some(seed) = lookup("FC_SEED").and_then(|v| v.trim().parse::<u64>().ok()) {
            self.seed = Some(seed);
        }
        if let Some(flag) = lookup("FC_AUTO_DUMMY").and_then(|v| parse_bool(&v)) {
            self.auto_dummy = flag;
        }
        if let Some(policy) = lookup("FC_FAILURE_POLICY").and_then(|v| parse_policy(&v)) {
            self.failure_policy = policy;
        }
        self
    }

    /// Reject settings that cannot produce a decomposition.
    pub fn validate(&self) -> Result<()> {
        if self.method != Method::CausalForest {
            return Err(Error::UnsupportedMethod(self.method));
        }
        if self.nboot1 == 0 {
            return Err(Error::Config("nboot1 must be at least 1".into()));
        }
        if self.nboot2 == 0 {
            return Err(Error::Config("nboot2 must be at least 1".into()));
        }
        self.forest.validate()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_policy(value: &str) -> Option<FailurePolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "skip" | "skip_replicate" => Some(FailurePolicy::SkipReplicate),
        "fail_fast" | "failfast" => Some(FailurePolicy::FailFast),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overlay(base: Config, vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        base.merge_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.nboot1, 1);
        assert_eq!(config.nboot2, 100);
        assert!(config.auto_dummy);
        assert_eq!(config.failure_policy, FailurePolicy::SkipReplicate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let config = Config {
            nboot1: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config {
            nboot2: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_med_dml_is_unsupported() {
        let config = Config {
            method: Method::MedDml,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::UnsupportedMethod(Method::MedDml))
        ));
    }

    #[test]
    fn test_merge_env_ignores_unset_keys() {
        // None of the FC_* keys are set under cargo test.
        let config = Config {
            nboot1: 7,
            ..Config::default()
        }
        .merge_env();
        assert_eq!(config.nboot1, 7);
    }

    #[test]
    fn test_env_overlay_applies_every_key() {
        let config = overlay(
            Config::default(),
            &[
                ("FC_NBOOT1", "12"),
                ("FC_NBOOT2", " 250 "),
                ("FC_SEED", "42"),
                ("FC_AUTO_DUMMY", "false"),
                ("FC_FAILURE_POLICY", "FAIL_FAST"),
            ],
        );
        assert_eq!(config.nboot1, 12);
        assert_eq!(config.nboot2, 250);
        assert_eq!(config.seed, Some(42));
        assert!(!config.auto_dummy);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);

        let config = overlay(
            config,
            &[("FC_AUTO_DUMMY", "1"), ("FC_FAILURE_POLICY", "skip")],
        );
        assert!(config.auto_dummy);
        assert_eq!(config.failure_policy, FailurePolicy::SkipReplicate);
    }

    #[test]
    fn test_env_overlay_ignores_unparseable_values() {
        let base = Config {
            nboot1: 3,
            seed: Some(9),
            ..Config::default()
        };
        let config = overlay(
            base.clone(),
            &[
                ("FC_NBOOT1", "three"),
                ("FC_NBOOT2", "-5"),
                ("FC_SEED", ""),
                ("FC_AUTO_DUMMY", "maybe"),
                ("FC_FAILURE_POLICY", "retry"),
            ],
        );
        assert_eq!(config, base);
    }

    #[test]
    fn test_bool_and_policy_spellings() {
        for v in ["1", "true", "YES", " True "] {
            assert_eq!(parse_bool(v), Some(true), "{v:?}");
        }
        for v in ["0", "false", "No"] {
            assert_eq!(parse_bool(v), Some(false), "{v:?}");
        }
        assert_eq!(parse_policy("skip_replicate"), Some(FailurePolicy::SkipReplicate));
        assert_eq!(parse_policy("failfast"), Some(FailurePolicy::FailFast));
        assert_eq!(parse_policy(""), None);
    }
}
