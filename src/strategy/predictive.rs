//! Predictive front-running: act on a forecast price move that also scores
//! as a good opportunity.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{absorb, Strategy, StrategyCore, Verdict};
use crate::config::{Comparison, RuntimeConfig, ThresholdConfig};
use crate::contracts::{ActionContracts, Invocation, OpportunityScorer, PricePredictor};
use crate::types::{ContractRole, ExecutionError, StrategyKind, Transaction, UnmetCause};

pub const OPPORTUNITY_THRESHOLD_KEY: &str = "FRONT_RUN_OPPORTUNITY_SCORE_THRESHOLD";
pub const MIN_MOVEMENT_KEY: &str = "PREDICTIVE_FRONT_RUN_MIN_MOVEMENT";
pub const REQUIRE_ALL_KEY: &str = "PREDICTIVE_FRONT_RUN_REQUIRE_ALL";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictiveConfig {
    pub opportunity_threshold: f64,
    /// Minimum magnitude of the predicted move, in percent.
    pub min_movement: f64,
    /// Both conditions must hold; when false either one suffices.
    pub require_all: bool,
    pub comparison: Comparison,
}

impl Default for PredictiveConfig {
    fn default() -> Self {
        Self {
            opportunity_threshold: 60.0,
            min_movement: 1.0,
            require_all: true,
            comparison: Comparison::Strict,
        }
    }
}

impl PredictiveConfig {
    pub fn from_thresholds(thresholds: &ThresholdConfig) -> Result<Self, ExecutionError> {
        let defaults = Self::default();
        let min_movement = thresholds.get_or(MIN_MOVEMENT_KEY, defaults.min_movement);
        if min_movement < 0.0 {
            return Err(ExecutionError::Config(format!(
                "{MIN_MOVEMENT_KEY} must not be negative ({min_movement})"
            )));
        }
        Ok(Self {
            opportunity_threshold: thresholds
                .get_or(OPPORTUNITY_THRESHOLD_KEY, defaults.opportunity_threshold),
            min_movement,
            require_all: thresholds.flag_or(REQUIRE_ALL_KEY, defaults.require_all),
            comparison: thresholds.comparison(),
        })
    }

    fn holds(&self, movement: f64, opportunity: f64) -> bool {
        let moves = self.comparison.exceeds(movement.abs(), self.min_movement);
        let worth_it = self.comparison.exceeds(opportunity, self.opportunity_threshold);
        if self.require_all {
            moves && worth_it
        } else {
            moves || worth_it
        }
    }
}

pub struct PredictiveStrategy {
    core: StrategyCore,
    predictor: Arc<dyn PricePredictor>,
    opportunity: Arc<dyn OpportunityScorer>,
    config: PredictiveConfig,
}

impl PredictiveStrategy {
    pub fn new(
        actions: ActionContracts,
        predictor: Arc<dyn PricePredictor>,
        opportunity: Arc<dyn OpportunityScorer>,
        config: PredictiveConfig,
        runtime: RuntimeConfig,
    ) -> Self {
        Self {
            core: StrategyCore::new(actions, runtime),
            predictor,
            opportunity,
            config,
        }
    }
}

#[async_trait]
impl Strategy for PredictiveStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Predictive
    }

    fn core(&self) -> &StrategyCore {
        &self.core
    }

    async fn evaluate(
        &self,
        tx: &Transaction,
        calls: &Invocation<'_>,
    ) -> Result<Verdict, ExecutionError> {
        // The opportunity scorer consumes the movement, so the calls are sequential.
        let movement = calls
            .score(
                ContractRole::PriceMovement,
                self.predictor.predict_price_movement(tx),
            )
            .await;
        let Some(movement) = absorb(self.kind(), tx, movement)? else {
            return Ok(Verdict::unmet(UnmetCause::SignalUnavailable));
        };

        let opportunity = calls
            .score(
                ContractRole::OpportunityScore,
                self.opportunity.calculate_opportunity_score(tx, movement),
            )
            .await;
        let Some(opportunity) = absorb(self.kind(), tx, opportunity)? else {
            return Ok(Verdict::unmet(UnmetCause::SignalUnavailable));
        };

        debug!(
            tx_id = %tx.id,
            movement = movement,
            opportunity = opportunity,
            min_movement = self.config.min_movement,
            threshold = self.config.opportunity_threshold,
            "Predictive signals"
        );

        if self.config.holds(movement, opportunity) {
            Ok(Verdict::Satisfied)
        } else {
            Ok(Verdict::unmet(UnmetCause::Predicate))
        }
    }
}
