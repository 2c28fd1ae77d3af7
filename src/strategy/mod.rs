//! Strategy contract and the four decision policies.
//!
//! Every variant follows the same procedure, implemented once here:
//! validate → variant scoring and predicate → cancellation check → act.
//! Variants only supply [`Strategy::evaluate`].

pub mod advanced;
pub mod aggressive;
pub mod predictive;
pub mod volatility;

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{RuntimeConfig, ThresholdConfig};
use crate::contracts::{
    ActionContracts, FrontRunner, Invocation, MarketConditionsSource, MarketDataSource,
    OpportunityScorer, PricePredictor, RiskScorer, TransactionValidator, VolatilityScorer,
};
use crate::types::{
    ContractRole, DecisionReason, DecisionResult, ExecutionError, StrategyKind, Transaction,
    UnmetCause,
};

pub use advanced::{AdvancedConfig, AdvancedStrategy};
pub use aggressive::{AggressiveConfig, AggressiveStrategy};
pub use predictive::{PredictiveConfig, PredictiveStrategy};
pub use volatility::{VolatilityConfig, VolatilityStrategy};

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Bindings and limits every variant owns.
#[derive(Clone)]
pub struct StrategyCore {
    pub actions: ActionContracts,
    pub runtime: RuntimeConfig,
}

impl StrategyCore {
    pub fn new(actions: ActionContracts, runtime: RuntimeConfig) -> Self {
        Self { actions, runtime }
    }
}

/// Outcome of a variant's scoring and predicate, before any action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    Declined(DecisionReason),
}

impl Verdict {
    pub fn below_threshold() -> Self {
        Verdict::Declined(DecisionReason::BelowThreshold)
    }

    pub fn unmet(cause: UnmetCause) -> Self {
        Verdict::Declined(DecisionReason::ConditionsUnmet(cause))
    }
}

/// A front-run decision policy.
///
/// Instances are immutable after construction and may be shared across
/// tasks; `execute` holds no lock across await points.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn core(&self) -> &StrategyCore;

    /// Variant-specific scoring and predicate. Must not call the front-run
    /// contract.
    async fn evaluate(
        &self,
        tx: &Transaction,
        calls: &Invocation<'_>,
    ) -> Result<Verdict, ExecutionError>;

    async fn execute(&self, tx: &Transaction) -> Result<DecisionResult, ExecutionError> {
        let cancel = CancellationToken::new();
        run(self, tx, &cancel).await
    }

    /// Like [`execute`](Self::execute), but never issues the action once
    /// `cancel` has fired.
    async fn execute_with_cancel(
        &self,
        tx: &Transaction,
        cancel: &CancellationToken,
    ) -> Result<DecisionResult, ExecutionError> {
        run(self, tx, cancel).await
    }
}

async fn run<S: Strategy + ?Sized>(
    strategy: &S,
    tx: &Transaction,
    cancel: &CancellationToken,
) -> Result<DecisionResult, ExecutionError> {
    tx.ensure_well_formed()?;

    let kind = strategy.kind();
    let core = strategy.core();
    let calls = Invocation::new(core.runtime.call_timeout(), cancel);

    debug!(strategy = %kind, tx_id = %tx.id, "Evaluating transaction");

    // Step 1 – validation
    match calls
        .call(ContractRole::Validate, core.actions.validator.validate(tx))
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            debug!(strategy = %kind, tx_id = %tx.id, "Transaction failed validation");
            return Ok(DecisionResult::skipped_invalid());
        }
        Err(ExecutionError::Cancelled) => return Err(ExecutionError::Cancelled),
        Err(e) => {
            warn!(strategy = %kind, tx_id = %tx.id, error = %e, "Validator failed, skipping");
            return Ok(DecisionResult::skipped_invalid());
        }
    }

    // Steps 2-3 – scoring and predicate
    let verdict = strategy.evaluate(tx, &calls).await?;
    if let Verdict::Declined(reason) = verdict {
        debug!(strategy = %kind, tx_id = %tx.id, reason = %reason, "Front-run declined");
        return Ok(DecisionResult::declined(reason));
    }

    if calls.is_cancelled() {
        info!(strategy = %kind, tx_id = %tx.id, "Cancelled after scoring, front-run not issued");
        return Err(ExecutionError::Cancelled);
    }

    // Step 4 – action
    info!(strategy = %kind, tx_id = %tx.id, "Conditions met, submitting front-run");
    match calls.act(core.actions.front_runner.front_run(tx)).await {
        Ok(true) => {
            info!(strategy = %kind, tx_id = %tx.id, "Front-run executed");
            Ok(DecisionResult::executed())
        }
        Ok(false) => {
            warn!(strategy = %kind, tx_id = %tx.id, "Front-run rejected by venue");
            Ok(DecisionResult::action_failed())
        }
        Err(e) => {
            warn!(strategy = %kind, tx_id = %tx.id, error = %e, "Front-run failed");
            Err(e)
        }
    }
}

/// Turn a scoring failure into `None` for variants that treat a missing
/// signal as an unmet condition. Cancellation always propagates.
pub(crate) fn absorb<T>(
    kind: StrategyKind,
    tx: &Transaction,
    outcome: Result<T, ExecutionError>,
) -> Result<Option<T>, ExecutionError> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(ExecutionError::Cancelled) => Err(ExecutionError::Cancelled),
        Err(e) => {
            warn!(strategy = %kind, tx_id = %tx.id, error = %e, "Signal unavailable, counted as unmet");
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Every contract a strategy might need. Unused bindings may stay `None`.
#[derive(Clone, Default)]
pub struct StrategyBindings {
    pub validator: Option<Arc<dyn TransactionValidator>>,
    pub front_runner: Option<Arc<dyn FrontRunner>>,
    pub risk_scorer: Option<Arc<dyn RiskScorer>>,
    pub price_predictor: Option<Arc<dyn PricePredictor>>,
    pub opportunity_scorer: Option<Arc<dyn OpportunityScorer>>,
    pub volatility_scorer: Option<Arc<dyn VolatilityScorer>>,
    pub market_conditions: Option<Arc<dyn MarketConditionsSource>>,
    pub market_data: Option<Arc<dyn MarketDataSource>>,
}

impl StrategyBindings {
    /// Bind every role to one object implementing all of them.
    pub fn from_venue<V>(venue: Arc<V>) -> Self
    where
        V: TransactionValidator
            + FrontRunner
            + RiskScorer
            + PricePredictor
            + OpportunityScorer
            + VolatilityScorer
            + MarketConditionsSource
            + MarketDataSource
            + 'static,
    {
        Self {
            validator: Some(venue.clone()),
            front_runner: Some(venue.clone()),
            risk_scorer: Some(venue.clone()),
            price_predictor: Some(venue.clone()),
            opportunity_scorer: Some(venue.clone()),
            volatility_scorer: Some(venue.clone()),
            market_conditions: Some(venue.clone()),
            market_data: Some(venue),
        }
    }

    fn actions(&self, kind: StrategyKind) -> Result<ActionContracts, ExecutionError> {
        Ok(ActionContracts::new(
            required(&self.validator, ContractRole::Validate, kind)?,
            required(&self.front_runner, ContractRole::FrontRun, kind)?,
        ))
    }
}

fn required<T: ?Sized>(
    binding: &Option<Arc<T>>,
    role: ContractRole,
    kind: StrategyKind,
) -> Result<Arc<T>, ExecutionError> {
    binding
        .clone()
        .ok_or_else(|| ExecutionError::Config(format!("{kind} strategy requires a {role} contract")))
}

/// Construct a strategy of `kind` from the bindings and threshold mapping.
pub fn build_strategy(
    kind: StrategyKind,
    bindings: &StrategyBindings,
    thresholds: &ThresholdConfig,
    runtime: RuntimeConfig,
) -> Result<Arc<dyn Strategy>, ExecutionError> {
    let actions = bindings.actions(kind)?;
    let strategy: Arc<dyn Strategy> = match kind {
        StrategyKind::Aggressive => Arc::new(AggressiveStrategy::new(
            actions,
            required(&bindings.risk_scorer, ContractRole::RiskScore, kind)?,
            AggressiveConfig::from_thresholds(thresholds)?,
            runtime,
        )),
        StrategyKind::Predictive => Arc::new(PredictiveStrategy::new(
            actions,
            required(&bindings.price_predictor, ContractRole::PriceMovement, kind)?,
            required(&bindings.opportunity_scorer, ContractRole::OpportunityScore, kind)?,
            PredictiveConfig::from_thresholds(thresholds)?,
            runtime,
        )),
        StrategyKind::Volatility => Arc::new(VolatilityStrategy::new(
            actions,
            required(&bindings.volatility_scorer, ContractRole::VolatilityScore, kind)?,
            VolatilityConfig::from_thresholds(thresholds)?,
            runtime,
        )),
        StrategyKind::Advanced => Arc::new(AdvancedStrategy::new(
            actions,
            required(&bindings.price_predictor, ContractRole::PriceMovement, kind)?,
            required(&bindings.market_conditions, ContractRole::MarketConditions, kind)?,
            required(&bindings.market_data, ContractRole::RealTimePrice, kind)?,
            AdvancedConfig::from_thresholds(thresholds)?,
            runtime,
        )),
    };
    Ok(strategy)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
