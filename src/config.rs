//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. The
//! `[thresholds]` table is kept as a flat `name -> number` mapping at this
//! boundary; each strategy variant converts it into its own typed config.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use crate::types::{ExecutionError, StrategyKind};

/// Key selecting inclusive (`>=`) instead of strict (`>`) comparisons.
pub const COMPARISON_INCLUSIVE_KEY: &str = "THRESHOLD_COMPARISON_INCLUSIVE";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub strategies: StrategiesConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

/// Per-call execution limits shared by every strategy.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Upper bound for each individual contract call. `None` = unbounded.
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
}

impl RuntimeConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            call_timeout_ms: Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StrategiesConfig {
    /// Evaluation order for the strategy chain.
    #[serde(default = "default_order")]
    pub order: Vec<StrategyKind>,
}

fn default_order() -> Vec<StrategyKind> {
    StrategyKind::ALL.to_vec()
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        if config.runtime.call_timeout_ms == Some(0) {
            anyhow::bail!("runtime.call_timeout_ms must be positive; omit it for no limit");
        }
        config.thresholds.ensure_finite()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// How a score is compared against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    /// `value > threshold`; equality does not satisfy.
    #[default]
    Strict,
    /// `value >= threshold`.
    Inclusive,
}

impl Comparison {
    pub fn exceeds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Strict => value > threshold,
            Comparison::Inclusive => value >= threshold,
        }
    }

    /// Whether `value` lies inside the band. A missing upper bound is open.
    pub fn within(self, value: f64, lower: f64, upper: Option<f64>) -> bool {
        let above = self.exceeds(value, lower);
        let below = match upper {
            Some(upper) => self.exceeds(upper, value),
            None => true,
        };
        above && below
    }
}

/// Flat mapping of named numeric thresholds, immutable once built.
///
/// Unknown keys are ignored by every variant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ThresholdConfig {
    values: HashMap<String, f64>,
}

impl ThresholdConfig {
    pub fn new(values: HashMap<String, f64>) -> Result<Self, ExecutionError> {
        let config = Self { values };
        config.ensure_finite()?;
        Ok(config)
    }

    /// Build from `(key, value)` pairs.
    pub fn from_pairs<K: Into<String>>(
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> Result<Self, ExecutionError> {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).unwrap_or(default)
    }

    /// A key the variant cannot run without.
    pub fn require(&self, key: &str) -> Result<f64, ExecutionError> {
        self.get(key)
            .ok_or_else(|| ExecutionError::Config(format!("missing required threshold {key}")))
    }

    /// Non-zero means true.
    pub fn flag_or(&self, key: &str, default: bool) -> bool {
        self.get(key).map(|v| v != 0.0).unwrap_or(default)
    }

    pub fn comparison(&self) -> Comparison {
        if self.flag_or(COMPARISON_INCLUSIVE_KEY, false) {
            Comparison::Inclusive
        } else {
            Comparison::Strict
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn ensure_finite(&self) -> Result<(), ExecutionError> {
        match self.values.iter().find(|(_, v)| !v.is_finite()) {
            Some((key, value)) => Err(ExecutionError::Config(format!(
                "threshold {key} is not a finite number ({value})"
            ))),
            None => Ok(()),
        }
    }
}
