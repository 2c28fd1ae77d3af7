//! Volatility front-running: act when recent price history is volatile enough.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{absorb, Strategy, StrategyCore, Verdict};
use crate::config::{Comparison, RuntimeConfig, ThresholdConfig};
use crate::contracts::{ActionContracts, Invocation, VolatilityScorer};
use crate::types::{ContractRole, ExecutionError, StrategyKind, Transaction, UnmetCause};

pub const VOLATILITY_THRESHOLD_KEY: &str = "VOLATILITY_FRONT_RUN_SCORE_THRESHOLD";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityConfig {
    pub volatility_threshold: f64,
    pub comparison: Comparison,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            volatility_threshold: 75.0,
            comparison: Comparison::Strict,
        }
    }
}

impl VolatilityConfig {
    pub fn from_thresholds(thresholds: &ThresholdConfig) -> Result<Self, ExecutionError> {
        let defaults = Self::default();
        Ok(Self {
            volatility_threshold: thresholds
                .get_or(VOLATILITY_THRESHOLD_KEY, defaults.volatility_threshold),
            comparison: thresholds.comparison(),
        })
    }
}

pub struct VolatilityStrategy {
    core: StrategyCore,
    scorer: Arc<dyn VolatilityScorer>,
    config: VolatilityConfig,
}

impl VolatilityStrategy {
    pub fn new(
        actions: ActionContracts,
        scorer: Arc<dyn VolatilityScorer>,
        config: VolatilityConfig,
        runtime: RuntimeConfig,
    ) -> Self {
        Self {
            core: StrategyCore::new(actions, runtime),
            scorer,
            config,
        }
    }
}

#[async_trait]
impl Strategy for VolatilityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Volatility
    }

    fn core(&self) -> &StrategyCore {
        &self.core
    }

    async fn evaluate(
        &self,
        tx: &Transaction,
        calls: &Invocation<'_>,
    ) -> Result<Verdict, ExecutionError> {
        if tx.historical_prices.is_empty() {
            debug!(tx_id = %tx.id, "No price history attached");
            return Ok(Verdict::unmet(UnmetCause::InsufficientData));
        }

        let score = calls
            .score(
                ContractRole::VolatilityScore,
                self.scorer
                    .calculate_volatility_score(tx, &tx.historical_prices),
            )
            .await;
        let Some(volatility) = absorb(self.kind(), tx, score)? else {
            return Ok(Verdict::unmet(UnmetCause::SignalUnavailable));
        };

        debug!(
            tx_id = %tx.id,
            volatility = volatility,
            samples = tx.historical_prices.len(),
            threshold = self.config.volatility_threshold,
            "Volatility score"
        );

        if self
            .config
            .comparison
            .exceeds(volatility, self.config.volatility_threshold)
        {
            Ok(Verdict::Satisfied)
        } else {
            Ok(Verdict::below_threshold())
        }
    }
}
