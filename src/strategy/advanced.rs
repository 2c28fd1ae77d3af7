//! Advanced front-running: combine four independent market signals.
//!
//! The signals (predicted movement, market conditions, spot price, traded
//! volume) are fetched concurrently. Each is wrapped in a [`Signal`] so a
//! failing source counts as an unmet condition instead of aborting the
//! evaluation. The strategy acts when at least `required_conditions` of the
//! four sub-conditions hold.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{Strategy, StrategyCore, Verdict};
use crate::config::{Comparison, RuntimeConfig, ThresholdConfig};
use crate::contracts::{
    ActionContracts, Invocation, MarketConditionsSource, MarketDataSource, PricePredictor,
};
use crate::types::{
    ContractRole, ExecutionError, MarketConditions, StrategyKind, Transaction, UnmetCause,
};

pub const MIN_MOVEMENT_KEY: &str = "ADVANCED_FRONT_RUN_MIN_PRICE_MOVEMENT";
pub const MIN_PRICE_KEY: &str = "ADVANCED_FRONT_RUN_MIN_PRICE";
pub const MAX_PRICE_KEY: &str = "ADVANCED_FRONT_RUN_MAX_PRICE";
pub const MIN_VOLUME_KEY: &str = "ADVANCED_FRONT_RUN_MIN_VOLUME";
pub const REQUIRED_CONDITIONS_KEY: &str = "ADVANCED_FRONT_RUN_REQUIRED_CONDITIONS";

/// Number of sub-conditions evaluated.
pub const CONDITION_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// One input to the composite predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    Available(T),
    /// The source failed, timed out, or could not be asked.
    Unavailable(String),
}

impl<T> Signal<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Signal::Available(_))
    }

    /// Whether the signal is present and satisfies `predicate`.
    pub fn holds(&self, predicate: impl FnOnce(&T) -> bool) -> bool {
        match self {
            Signal::Available(value) => predicate(value),
            Signal::Unavailable(_) => false,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Available(value) => write!(f, "{value}"),
            Signal::Unavailable(reason) => write!(f, "unavailable ({reason})"),
        }
    }
}

/// The four signals collected for one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedSignals {
    pub movement: Signal<f64>,
    pub conditions: Signal<MarketConditions>,
    pub price: Signal<f64>,
    pub volume: Signal<f64>,
}

impl AdvancedSignals {
    pub fn available(&self) -> usize {
        [
            self.movement.is_available(),
            self.conditions.is_available(),
            self.price.is_available(),
            self.volume.is_available(),
        ]
        .into_iter()
        .filter(|available| *available)
        .count()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvancedConfig {
    pub min_movement: f64,
    pub min_price: f64,
    /// Open upper bound when `None`.
    pub max_price: Option<f64>,
    /// No default; must be supplied.
    pub min_volume: f64,
    /// How many of the four sub-conditions must hold (1..=4).
    pub required_conditions: usize,
    pub comparison: Comparison,
}

impl AdvancedConfig {
    /// Defaults for everything but the volume floor.
    pub fn with_min_volume(min_volume: f64) -> Self {
        Self {
            min_movement: 1.0,
            min_price: 0.0,
            max_price: None,
            min_volume,
            required_conditions: CONDITION_COUNT,
            comparison: Comparison::Strict,
        }
    }

    pub fn from_thresholds(thresholds: &ThresholdConfig) -> Result<Self, ExecutionError> {
        let defaults = Self::with_min_volume(thresholds.require(MIN_VOLUME_KEY)?);

        let required = thresholds.get_or(
            REQUIRED_CONDITIONS_KEY,
            defaults.required_conditions as f64,
        );
        if required.fract() != 0.0 || !(1.0..=CONDITION_COUNT as f64).contains(&required) {
            return Err(ExecutionError::Config(format!(
                "{REQUIRED_CONDITIONS_KEY} must be an integer between 1 and {CONDITION_COUNT} (got {required})"
            )));
        }

        let min_price = thresholds.get_or(MIN_PRICE_KEY, defaults.min_price);
        let max_price = thresholds.get(MAX_PRICE_KEY);
        if let Some(max) = max_price {
            if max <= min_price {
                return Err(ExecutionError::Config(format!(
                    "{MAX_PRICE_KEY} ({max}) must be above {MIN_PRICE_KEY} ({min_price})"
                )));
            }
        }

        Ok(Self {
            min_movement: thresholds.get_or(MIN_MOVEMENT_KEY, defaults.min_movement),
            min_price,
            max_price,
            min_volume: defaults.min_volume,
            required_conditions: required as usize,
            comparison: thresholds.comparison(),
        })
    }

    /// Count the sub-conditions the signals satisfy. Unavailable signals
    /// count as unmet.
    pub fn satisfied(&self, signals: &AdvancedSignals) -> usize {
        let cmp = self.comparison;
        [
            signals
                .movement
                .holds(|movement| cmp.exceeds(*movement, self.min_movement)),
            signals.conditions.holds(MarketConditions::is_favorable),
            signals
                .price
                .holds(|price| cmp.within(*price, self.min_price, self.max_price)),
            signals
                .volume
                .holds(|volume| cmp.exceeds(*volume, self.min_volume)),
        ]
        .into_iter()
        .filter(|met| *met)
        .count()
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

pub struct AdvancedStrategy {
    core: StrategyCore,
    predictor: Arc<dyn PricePredictor>,
    conditions: Arc<dyn MarketConditionsSource>,
    market_data: Arc<dyn MarketDataSource>,
    config: AdvancedConfig,
}

impl AdvancedStrategy {
    pub fn new(
        actions: ActionContracts,
        predictor: Arc<dyn PricePredictor>,
        conditions: Arc<dyn MarketConditionsSource>,
        market_data: Arc<dyn MarketDataSource>,
        config: AdvancedConfig,
        runtime: RuntimeConfig,
    ) -> Self {
        Self {
            core: StrategyCore::new(actions, runtime),
            predictor,
            conditions,
            market_data,
            config,
        }
    }

    /// Fetch all four signals concurrently.
    pub async fn gather(
        &self,
        tx: &Transaction,
        calls: &Invocation<'_>,
    ) -> Result<AdvancedSignals, ExecutionError> {
        let token = tx.token_id.as_deref();

        let movement = calls.score(
            ContractRole::PriceMovement,
            self.predictor.predict_price_movement(tx),
        );
        let conditions = calls.call(
            ContractRole::MarketConditions,
            self.conditions.check_market_conditions(tx),
        );
        let price = async {
            match token {
                Some(token) => Some(
                    calls
                        .score(
                            ContractRole::RealTimePrice,
                            self.market_data.get_real_time_price(token),
                        )
                        .await,
                ),
                None => None,
            }
        };
        let volume = async {
            match token {
                Some(token) => Some(
                    calls
                        .score(
                            ContractRole::TokenVolume,
                            self.market_data.get_token_volume(token),
                        )
                        .await,
                ),
                None => None,
            }
        };

        let (movement, conditions, price, volume) =
            tokio::join!(movement, conditions, price, volume);

        Ok(AdvancedSignals {
            movement: signal(tx, ContractRole::PriceMovement, Some(movement))?,
            conditions: signal(tx, ContractRole::MarketConditions, Some(conditions))?,
            price: signal(tx, ContractRole::RealTimePrice, price)?,
            volume: signal(tx, ContractRole::TokenVolume, volume)?,
        })
    }
}

fn signal<T>(
    tx: &Transaction,
    role: ContractRole,
    outcome: Option<Result<T, ExecutionError>>,
) -> Result<Signal<T>, ExecutionError> {
    match outcome {
        Some(Ok(value)) => Ok(Signal::Available(value)),
        Some(Err(ExecutionError::Cancelled)) => Err(ExecutionError::Cancelled),
        Some(Err(e)) => {
            warn!(tx_id = %tx.id, contract = %role, error = %e, "Advanced signal unavailable");
            Ok(Signal::Unavailable(e.to_string()))
        }
        None => Ok(Signal::Unavailable("no token id attached".to_string())),
    }
}

#[async_trait]
impl Strategy for AdvancedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Advanced
    }

    fn core(&self) -> &StrategyCore {
        &self.core
    }

    async fn evaluate(
        &self,
        tx: &Transaction,
        calls: &Invocation<'_>,
    ) -> Result<Verdict, ExecutionError> {
        let signals = self.gather(tx, calls).await?;

        if signals.available() == 0 {
            return Ok(Verdict::unmet(UnmetCause::InsufficientData));
        }

        let satisfied = self.config.satisfied(&signals);
        debug!(
            tx_id = %tx.id,
            movement = %signals.movement,
            conditions = %signals.conditions,
            price = %signals.price,
            volume = %signals.volume,
            satisfied = satisfied,
            required = self.config.required_conditions,
            "Advanced signals"
        );

        if satisfied >= self.config.required_conditions {
            Ok(Verdict::Satisfied)
        } else if signals.available() < CONDITION_COUNT {
            Ok(Verdict::unmet(UnmetCause::SignalUnavailable))
        } else {
            Ok(Verdict::unmet(UnmetCause::Predicate))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
