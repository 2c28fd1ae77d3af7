//! Simulated venue for dry runs.
//!
//! Implements every contract with fixed, configurable responses and keeps a
//! count of submitted front-runs. Nothing leaves the process.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::{
    FrontRunner, MarketConditionsSource, MarketDataSource, OpportunityScorer, PricePredictor,
    RiskScorer, TransactionValidator, VolatilityScorer,
};
use crate::types::{MarketConditions, MarketTrend, Transaction};

/// Canned responses returned by [`SimulatedVenue`].
#[derive(Debug, Clone)]
pub struct SimulatedResponses {
    pub valid: bool,
    pub risk_score: f64,
    pub predicted_movement: f64,
    pub opportunity_score: f64,
    pub volatility_score: f64,
    pub conditions: MarketConditions,
    pub price: f64,
    pub volume: f64,
    pub front_run_accepted: bool,
}

impl Default for SimulatedResponses {
    fn default() -> Self {
        Self {
            valid: true,
            risk_score: 80.0,
            predicted_movement: 10.5,
            opportunity_score: 70.0,
            volatility_score: 85.0,
            conditions: MarketConditions {
                trend: MarketTrend::Bullish,
                high_volatility: true,
                low_liquidity: false,
            },
            price: 10.0,
            volume: 1_000_000.0,
            front_run_accepted: true,
        }
    }
}

pub struct SimulatedVenue {
    responses: SimulatedResponses,
    submitted: AtomicUsize,
}

impl SimulatedVenue {
    pub fn new(responses: SimulatedResponses) -> Self {
        Self {
            responses,
            submitted: AtomicUsize::new(0),
        }
    }

    /// Number of front-runs submitted so far.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedVenue {
    fn default() -> Self {
        Self::new(SimulatedResponses::default())
    }
}

#[async_trait]
impl TransactionValidator for SimulatedVenue {
    async fn validate(&self, _tx: &Transaction) -> Result<bool> {
        Ok(self.responses.valid)
    }
}

#[async_trait]
impl FrontRunner for SimulatedVenue {
    async fn front_run(&self, tx: &Transaction) -> Result<bool> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        info!(tx_id = %tx.id, accepted = self.responses.front_run_accepted, "[DRY RUN] Would submit front-run");
        Ok(self.responses.front_run_accepted)
    }
}

#[async_trait]
impl RiskScorer for SimulatedVenue {
    async fn calculate_risk_score(&self, _tx: &Transaction) -> Result<f64> {
        Ok(self.responses.risk_score)
    }
}

#[async_trait]
impl PricePredictor for SimulatedVenue {
    async fn predict_price_movement(&self, _tx: &Transaction) -> Result<f64> {
        Ok(self.responses.predicted_movement)
    }
}

#[async_trait]
impl OpportunityScorer for SimulatedVenue {
    async fn calculate_opportunity_score(&self, _tx: &Transaction, _movement: f64) -> Result<f64> {
        Ok(self.responses.opportunity_score)
    }
}

#[async_trait]
impl VolatilityScorer for SimulatedVenue {
    async fn calculate_volatility_score(&self, _tx: &Transaction, _history: &[f64]) -> Result<f64> {
        Ok(self.responses.volatility_score)
    }
}

#[async_trait]
impl MarketConditionsSource for SimulatedVenue {
    async fn check_market_conditions(&self, _tx: &Transaction) -> Result<MarketConditions> {
        Ok(self.responses.conditions)
    }
}

#[async_trait]
impl MarketDataSource for SimulatedVenue {
    async fn get_real_time_price(&self, _token_id: &str) -> Result<f64> {
        Ok(self.responses.price)
    }

    async fn get_token_volume(&self, _token_id: &str) -> Result<f64> {
        Ok(self.responses.volume)
    }
}
