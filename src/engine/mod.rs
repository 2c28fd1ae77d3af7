//! Strategy chain: run several strategies against one transaction.
//!
//! Strategies are tried in configured order until one reaches the front-run
//! step, whether the submission succeeds or not, so at most one front-run is
//! issued per transaction. Every step is kept in a decision log for auditing.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{RuntimeConfig, ThresholdConfig};
use crate::strategy::{build_strategy, Strategy, StrategyBindings};
use crate::types::{DecisionResult, ExecutionError, StrategyKind, Transaction};

// ---------------------------------------------------------------------------
// Decision log
// ---------------------------------------------------------------------------

/// What happened when one strategy in the chain looked at a transaction.
#[derive(Debug, Clone, Serialize)]
pub enum DecisionRecord {
    /// The strategy reached a decision (executed or not).
    Decided {
        kind: StrategyKind,
        result: DecisionResult,
        at: DateTime<Utc>,
    },
    /// The strategy returned an error.
    Failed {
        kind: StrategyKind,
        error: String,
        /// Whether the error stopped the chain.
        terminal: bool,
        at: DateTime<Utc>,
    },
}

impl DecisionRecord {
    pub fn kind(&self) -> StrategyKind {
        match self {
            DecisionRecord::Decided { kind, .. } | DecisionRecord::Failed { kind, .. } => *kind,
        }
    }
}

/// Result of running the chain over one transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ChainOutcome {
    pub tx_id: String,
    pub records: Vec<DecisionRecord>,
}

impl ChainOutcome {
    /// The strategy whose front-run was executed, if any.
    pub fn executed_by(&self) -> Option<StrategyKind> {
        self.records.iter().find_map(|record| match record {
            DecisionRecord::Decided { kind, result, .. } if result.executed => Some(*kind),
            _ => None,
        })
    }

    /// Whether a terminal error cut the chain short.
    pub fn halted(&self) -> bool {
        self.records
            .iter()
            .any(|record| matches!(record, DecisionRecord::Failed { terminal: true, .. }))
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

pub struct StrategyChain {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// Build one strategy per entry in `order`.
    pub fn from_order(
        order: &[StrategyKind],
        bindings: &StrategyBindings,
        thresholds: &ThresholdConfig,
        runtime: RuntimeConfig,
    ) -> Result<Self, ExecutionError> {
        let strategies = order
            .iter()
            .map(|kind| build_strategy(*kind, bindings, thresholds, runtime))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(strategies))
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run the strategies in order until one reaches the front-run step or a
    /// terminal error occurs.
    pub async fn evaluate(&self, tx: &Transaction, cancel: &CancellationToken) -> ChainOutcome {
        let mut records = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let kind = strategy.kind();
            match strategy.execute_with_cancel(tx, cancel).await {
                Ok(result) => {
                    debug!(strategy = %kind, tx_id = %tx.id, result = %result, "Strategy decided");
                    records.push(DecisionRecord::Decided {
                        kind,
                        result,
                        at: Utc::now(),
                    });
                    if result.reached_action() {
                        info!(
                            strategy = %kind,
                            tx_id = %tx.id,
                            executed = result.executed,
                            "Front-run submitted, chain complete"
                        );
                        break;
                    }
                }
                Err(e) => {
                    let terminal = e.is_terminal();
                    warn!(strategy = %kind, tx_id = %tx.id, error = %e, terminal, "Strategy failed");
                    records.push(DecisionRecord::Failed {
                        kind,
                        error: e.to_string(),
                        terminal,
                        at: Utc::now(),
                    });
                    if terminal {
                        break;
                    }
                }
            }
        }

        ChainOutcome {
            tx_id: tx.id.clone(),
            records,
        }
    }

    /// Evaluate many transactions concurrently. Outcomes keep input order.
    pub async fn evaluate_batch(
        &self,
        txs: &[Transaction],
        cancel: &CancellationToken,
    ) -> Vec<ChainOutcome> {
        let outcomes = join_all(txs.iter().map(|tx| self.evaluate(tx, cancel))).await;

        let executed = outcomes.iter().filter(|o| o.executed_by().is_some()).count();
        info!(
            transactions = txs.len(),
            executed = executed,
            "Batch evaluation complete"
        );
        outcomes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
