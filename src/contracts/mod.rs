//! Injected contracts.
//!
//! Each externally owned function the core depends on is a small async
//! trait, one per role, so strategies can be bound to real implementations
//! or deterministic doubles interchangeably. `Invocation` wraps every call
//! with the per-call timeout and the caller's cancellation token.

pub mod simulated;

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::types::{ContractRole, ExecutionError, MarketConditions, Transaction};

// ---------------------------------------------------------------------------
// Action contracts
// ---------------------------------------------------------------------------

/// Decides whether a transaction is worth looking at.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionValidator: Send + Sync {
    async fn validate(&self, tx: &Transaction) -> Result<bool>;
}

/// Submits the competing transaction. Irreversible once it returns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrontRunner: Send + Sync {
    /// Returns `false` if the venue refused the submission.
    async fn front_run(&self, tx: &Transaction) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Scoring contracts
// ---------------------------------------------------------------------------

/// Risk score, conventionally 0–100.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RiskScorer: Send + Sync {
    async fn calculate_risk_score(&self, tx: &Transaction) -> Result<f64>;
}

/// Signed predicted price movement in percent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PricePredictor: Send + Sync {
    async fn predict_price_movement(&self, tx: &Transaction) -> Result<f64>;
}

/// Opportunity score, conventionally 0–100.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpportunityScorer: Send + Sync {
    async fn calculate_opportunity_score(&self, tx: &Transaction, movement: f64) -> Result<f64>;
}

/// Volatility score over caller-supplied price history, conventionally 0–100.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VolatilityScorer: Send + Sync {
    async fn calculate_volatility_score(
        &self,
        tx: &Transaction,
        historical_prices: &[f64],
    ) -> Result<f64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketConditionsSource: Send + Sync {
    async fn check_market_conditions(&self, tx: &Transaction) -> Result<MarketConditions>;
}

/// Spot price and traded volume per token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn get_real_time_price(&self, token_id: &str) -> Result<f64>;

    async fn get_token_volume(&self, token_id: &str) -> Result<f64>;
}

/// The two contracts every strategy variant needs.
#[derive(Clone)]
pub struct ActionContracts {
    pub validator: Arc<dyn TransactionValidator>,
    pub front_runner: Arc<dyn FrontRunner>,
}

impl ActionContracts {
    pub fn new(
        validator: Arc<dyn TransactionValidator>,
        front_runner: Arc<dyn FrontRunner>,
    ) -> Self {
        Self {
            validator,
            front_runner,
        }
    }
}

// ---------------------------------------------------------------------------
// Guarded invocation
// ---------------------------------------------------------------------------

/// Per-`execute` call policy: timeout for each contract, and the token whose
/// cancellation aborts any pending validation or scoring call.
pub struct Invocation<'a> {
    timeout: Option<Duration>,
    cancel: &'a CancellationToken,
}

impl<'a> Invocation<'a> {
    pub fn new(timeout: Option<Duration>, cancel: &'a CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Await a validation or scoring contract, racing cancellation.
    pub async fn call<T, F>(&self, role: ContractRole, call: F) -> Result<T, ExecutionError>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ExecutionError::Cancelled),
            outcome = bounded(role, self.timeout, call) => outcome,
        }
    }

    /// Like [`call`](Self::call), but the value must be a finite number.
    pub async fn score<F>(&self, role: ContractRole, call: F) -> Result<f64, ExecutionError>
    where
        F: Future<Output = Result<f64>>,
    {
        let value = self.call(role, call).await?;
        ensure_finite(role, value)
    }

    /// Await the front-run contract. Not raced against cancellation: once
    /// submitted, the outcome must be observed.
    pub async fn act<F>(&self, call: F) -> Result<bool, ExecutionError>
    where
        F: Future<Output = Result<bool>>,
    {
        bounded(ContractRole::FrontRun, self.timeout, call)
            .await
            .map_err(|e| match e {
                ExecutionError::ContractFailure { message, .. } => {
                    ExecutionError::ActionFailure(message)
                }
                other => other,
            })
    }
}

async fn bounded<T, F>(
    role: ContractRole,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, ExecutionError>
where
    F: Future<Output = Result<T>>,
{
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return Err(ExecutionError::contract(
                    role,
                    format!("timed out after {}ms", limit.as_millis()),
                ))
            }
        },
        None => call.await,
    };
    outcome.map_err(|e| ExecutionError::contract(role, format!("{e:#}")))
}

pub fn ensure_finite(role: ContractRole, value: f64) -> Result<f64, ExecutionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExecutionError::contract(
            role,
            format!("returned non-finite value {value}"),
        ))
    }
}
