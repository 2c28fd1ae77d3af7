//! Aggressive front-running: act whenever the risk score clears a threshold.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{Strategy, StrategyCore, Verdict};
use crate::config::{Comparison, RuntimeConfig, ThresholdConfig};
use crate::contracts::{ActionContracts, Invocation, RiskScorer};
use crate::types::{ContractRole, ExecutionError, StrategyKind, Transaction};

pub const RISK_THRESHOLD_KEY: &str = "AGGRESSIVE_FRONT_RUN_RISK_SCORE_THRESHOLD";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggressiveConfig {
    /// Risk score the transaction must exceed.
    pub risk_threshold: f64,
    pub comparison: Comparison,
}

impl Default for AggressiveConfig {
    fn default() -> Self {
        Self {
            risk_threshold: 70.0,
            comparison: Comparison::Strict,
        }
    }
}

impl AggressiveConfig {
    pub fn from_thresholds(thresholds: &ThresholdConfig) -> Result<Self, ExecutionError> {
        let defaults = Self::default();
        Ok(Self {
            risk_threshold: thresholds.get_or(RISK_THRESHOLD_KEY, defaults.risk_threshold),
            comparison: thresholds.comparison(),
        })
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

pub struct AggressiveStrategy {
    core: StrategyCore,
    risk_scorer: Arc<dyn RiskScorer>,
    config: AggressiveConfig,
}

impl AggressiveStrategy {
    pub fn new(
        actions: ActionContracts,
        risk_scorer: Arc<dyn RiskScorer>,
        config: AggressiveConfig,
        runtime: RuntimeConfig,
    ) -> Self {
        Self {
            core: StrategyCore::new(actions, runtime),
            risk_scorer,
            config,
        }
    }
}

#[async_trait]
impl Strategy for AggressiveStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Aggressive
    }

    fn core(&self) -> &StrategyCore {
        &self.core
    }

    /// A failing risk scorer is an error, not a decline: there is nothing
    /// else to base the decision on.
    async fn evaluate(
        &self,
        tx: &Transaction,
        calls: &Invocation<'_>,
    ) -> Result<Verdict, ExecutionError> {
        let risk = calls
            .score(
                ContractRole::RiskScore,
                self.risk_scorer.calculate_risk_score(tx),
            )
            .await?;

        debug!(
            tx_id = %tx.id,
            risk = risk,
            threshold = self.config.risk_threshold,
            "Aggressive risk score"
        );

        if self.config.comparison.exceeds(risk, self.config.risk_threshold) {
            Ok(Verdict::Satisfied)
        } else {
            Ok(Verdict::below_threshold())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
