//! Shared types for the front-run decision core.
//!
//! These types form the data model used across all modules. Contract,
//! strategy and engine modules depend on them without depending on each
//! other.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A pending transaction observed on a venue.
///
/// The core treats this as an opaque handle: `payload` is never inspected
/// and is passed unchanged to the injected contracts. `token_id` and
/// `historical_prices` are annotations attached by the caller before
/// evaluation; the core forwards them to contracts but does not derive them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Venue-level identifier (hash or similar). Must be non-empty.
    pub id: String,
    /// Raw transaction body as received from the venue.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Token identifier extracted by the caller.
    #[serde(default)]
    pub token_id: Option<String>,
    /// Past prices for the token, oldest first.
    #[serde(default)]
    pub historical_prices: Vec<f64>,
}

impl Transaction {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: serde_json::Value::Null,
            token_id: None,
            historical_prices: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_token(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    pub fn with_history(mut self, prices: Vec<f64>) -> Self {
        self.historical_prices = prices;
        self
    }

    /// Reject handles that cannot identify anything.
    pub fn ensure_well_formed(&self) -> Result<(), ExecutionError> {
        if self.id.trim().is_empty() {
            return Err(ExecutionError::InvalidInput(
                "transaction id is empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token_id {
            Some(token) => write!(f, "tx {} ({token})", self.id),
            None => write!(f, "tx {}", self.id),
        }
    }
}

// ---------------------------------------------------------------------------
// Market conditions
// ---------------------------------------------------------------------------

/// Trend classification reported by the market-conditions contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketTrend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketTrend::Bullish => write!(f, "Bullish"),
            MarketTrend::Bearish => write!(f, "Bearish"),
            MarketTrend::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Snapshot of market conditions around a transaction's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConditions {
    pub trend: MarketTrend,
    #[serde(default)]
    pub high_volatility: bool,
    #[serde(default)]
    pub low_liquidity: bool,
}

impl MarketConditions {
    pub fn new(trend: MarketTrend) -> Self {
        Self {
            trend,
            high_volatility: false,
            low_liquidity: false,
        }
    }

    /// Conditions support front-running: rising market with usable liquidity.
    pub fn is_favorable(&self) -> bool {
        self.trend == MarketTrend::Bullish && !self.low_liquidity
    }
}

impl fmt::Display for MarketConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | volatility: {} | liquidity: {}",
            self.trend,
            if self.high_volatility { "high" } else { "normal" },
            if self.low_liquidity { "low" } else { "adequate" },
        )
    }
}

// ---------------------------------------------------------------------------
// Strategy kinds
// ---------------------------------------------------------------------------

/// The four decision policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    Aggressive,
    Predictive,
    Volatility,
    Advanced,
}

impl StrategyKind {
    pub const ALL: &'static [StrategyKind] = &[
        StrategyKind::Aggressive,
        StrategyKind::Predictive,
        StrategyKind::Volatility,
        StrategyKind::Advanced,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Aggressive => write!(f, "Aggressive"),
            StrategyKind::Predictive => write!(f, "Predictive"),
            StrategyKind::Volatility => write!(f, "Volatility"),
            StrategyKind::Advanced => write!(f, "Advanced"),
        }
    }
}

/// Parse a strategy name (case-insensitive).
impl std::str::FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aggressive" => Ok(StrategyKind::Aggressive),
            "predictive" => Ok(StrategyKind::Predictive),
            "volatility" | "volatile" => Ok(StrategyKind::Volatility),
            "advanced" | "composite" => Ok(StrategyKind::Advanced),
            other => Err(anyhow::anyhow!("Unknown strategy kind: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Decision result
// ---------------------------------------------------------------------------

/// Why a multi-condition predicate was not satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnmetCause {
    /// All signals arrived; the predicate simply did not hold.
    Predicate,
    /// At least one signal could not be obtained and the rest did not
    /// satisfy the predicate on their own.
    SignalUnavailable,
    /// No usable input at all (every signal failed, or empty history).
    InsufficientData,
}

impl fmt::Display for UnmetCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmetCause::Predicate => write!(f, "predicate not satisfied"),
            UnmetCause::SignalUnavailable => write!(f, "signal unavailable"),
            UnmetCause::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionReason {
    SkippedInvalid,
    BelowThreshold,
    ConditionsUnmet(UnmetCause),
    ActionFailed,
    Executed,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::SkippedInvalid => write!(f, "skipped: invalid transaction"),
            DecisionReason::BelowThreshold => write!(f, "below threshold"),
            DecisionReason::ConditionsUnmet(cause) => write!(f, "conditions unmet ({cause})"),
            DecisionReason::ActionFailed => write!(f, "front-run rejected"),
            DecisionReason::Executed => write!(f, "front-run executed"),
        }
    }
}

/// Outcome of one `execute` call. Built fresh per call and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub executed: bool,
    pub reason: DecisionReason,
}

impl DecisionResult {
    pub fn skipped_invalid() -> Self {
        Self::declined(DecisionReason::SkippedInvalid)
    }

    pub fn executed() -> Self {
        Self {
            executed: true,
            reason: DecisionReason::Executed,
        }
    }

    pub fn action_failed() -> Self {
        Self::declined(DecisionReason::ActionFailed)
    }

    pub fn declined(reason: DecisionReason) -> Self {
        Self {
            executed: false,
            reason,
        }
    }

    /// Whether the front-run contract was called, successfully or not.
    pub fn reached_action(&self) -> bool {
        matches!(
            self.reason,
            DecisionReason::Executed | DecisionReason::ActionFailed
        )
    }
}

impl fmt::Display for DecisionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "executed={} ({})", self.executed, self.reason)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Which injected contract an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractRole {
    Validate,
    FrontRun,
    RiskScore,
    PriceMovement,
    OpportunityScore,
    VolatilityScore,
    MarketConditions,
    RealTimePrice,
    TokenVolume,
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractRole::Validate => "validateTransaction",
            ContractRole::FrontRun => "frontRun",
            ContractRole::RiskScore => "calculateRiskScore",
            ContractRole::PriceMovement => "predictPriceMovement",
            ContractRole::OpportunityScore => "calculateOpportunityScore",
            ContractRole::VolatilityScore => "calculateVolatilityScore",
            ContractRole::MarketConditions => "checkMarketConditions",
            ContractRole::RealTimePrice => "getRealTimePrice",
            ContractRole::TokenVolume => "getTokenVolume",
        };
        write!(f, "{name}")
    }
}

/// Typed failures surfaced by `Strategy::execute` and by construction.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Contract failure ({contract}): {message}")]
    ContractFailure {
        contract: ContractRole,
        message: String,
    },

    #[error("Front-run action failed: {0}")]
    ActionFailure(String),

    #[error("Evaluation cancelled before front-run")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExecutionError {
    pub fn contract(contract: ContractRole, message: impl Into<String>) -> Self {
        Self::ContractFailure {
            contract,
            message: message.into(),
        }
    }

    /// Errors after which no other strategy may look at the same
    /// transaction. A failed front-run may still have landed, so it is
    /// never retried.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::Cancelled | Self::ActionFailure(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
