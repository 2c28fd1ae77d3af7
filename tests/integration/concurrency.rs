//! Concurrent evaluation: many transactions through shared strategy
//! instances at once.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

use frontrun::config::{RuntimeConfig, ThresholdConfig};
use frontrun::contracts::simulated::SimulatedResponses;
use frontrun::engine::{DecisionRecord, StrategyChain};
use frontrun::strategy::{build_strategy, StrategyBindings};
use frontrun::types::*;

use crate::mock_contracts::RecordingVenue;

const N: usize = 24;

fn tx(i: usize) -> Transaction {
    // Even transactions clear the default aggressive threshold, odd ones do not.
    let risk = if i % 2 == 0 { 90.0 } else { 40.0 };
    Transaction::new(format!("0x{i:04}")).with_payload(serde_json::json!({ "risk": risk }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_see_only_their_own_transaction() {
    let venue = Arc::new(RecordingVenue::default().with_delay(Duration::from_millis(5)));
    let strategy = build_strategy(
        StrategyKind::Aggressive,
        &StrategyBindings::from_venue(venue.clone()),
        &ThresholdConfig::default(),
        RuntimeConfig::default(),
    )
    .unwrap();

    let txs: Vec<Transaction> = (0..N).map(tx).collect();
    let results = join_all(txs.iter().map(|t| strategy.execute(t))).await;

    for (i, result) in results.into_iter().enumerate() {
        let result = assert_ok!(result);
        let expected = if i % 2 == 0 {
            vec![
                ContractRole::Validate,
                ContractRole::RiskScore,
                ContractRole::FrontRun,
            ]
        } else {
            vec![ContractRole::Validate, ContractRole::RiskScore]
        };
        assert_eq!(result.executed, i % 2 == 0, "tx {i}");
        assert_eq!(venue.calls_for(&txs[i].id), expected, "tx {i}");
    }
    assert_eq!(venue.count(ContractRole::FrontRun), N / 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spawned_tasks_share_one_instance() {
    let venue = Arc::new(RecordingVenue::default().with_delay(Duration::from_millis(2)));
    let strategy = build_strategy(
        StrategyKind::Aggressive,
        &StrategyBindings::from_venue(venue.clone()),
        &ThresholdConfig::default(),
        RuntimeConfig::default(),
    )
    .unwrap();

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let strategy = strategy.clone();
            tokio::spawn(async move { strategy.execute(&tx(i)).await })
        })
        .collect();

    let mut executed = 0;
    for handle in handles {
        if assert_ok!(handle.await.unwrap()).executed {
            executed += 1;
        }
    }
    assert_eq!(executed, N / 2);
    assert_eq!(venue.count(ContractRole::Validate), N);
}

#[tokio::test]
async fn chain_batch_issues_at_most_one_front_run_per_transaction() {
    let venue = Arc::new(RecordingVenue::default().with_delay(Duration::from_millis(1)));
    let thresholds =
        ThresholdConfig::from_pairs([("ADVANCED_FRONT_RUN_MIN_VOLUME", 10_000.0)]).unwrap();
    let chain = StrategyChain::from_order(
        StrategyKind::ALL,
        &StrategyBindings::from_venue(venue.clone()),
        &thresholds,
        RuntimeConfig::default(),
    )
    .unwrap();

    let txs: Vec<Transaction> = (0..N)
        .map(|i| tx(i).with_history(vec![1.0, 1.2, 0.9]))
        .collect();
    let outcomes = chain.evaluate_batch(&txs, &CancellationToken::new()).await;

    for (i, outcome) in outcomes.iter().enumerate() {
        let fronts = venue
            .calls_for(&txs[i].id)
            .into_iter()
            .filter(|c| *c == ContractRole::FrontRun)
            .count();
        assert_eq!(fronts, 1, "tx {i}");
        let expected = if i % 2 == 0 {
            StrategyKind::Aggressive
        } else {
            StrategyKind::Predictive
        };
        assert_eq!(outcome.executed_by(), Some(expected), "tx {i}");
    }
}

fn full_chain(venue: Arc<RecordingVenue>) -> StrategyChain {
    let thresholds =
        ThresholdConfig::from_pairs([("ADVANCED_FRONT_RUN_MIN_VOLUME", 10_000.0)]).unwrap();
    StrategyChain::from_order(
        StrategyKind::ALL,
        &StrategyBindings::from_venue(venue),
        &thresholds,
        RuntimeConfig::default(),
    )
    .unwrap()
}

fn eligible_everywhere() -> Transaction {
    Transaction::new("0xfail")
        .with_token("MOCK_TOKEN")
        .with_history(vec![1.0, 1.2, 0.9])
}

#[tokio::test]
async fn chain_stops_after_failed_front_run() {
    let venue = Arc::new(RecordingVenue::default());
    venue.fail(ContractRole::FrontRun);

    let outcome = full_chain(venue.clone())
        .evaluate(&eligible_everywhere(), &CancellationToken::new())
        .await;

    assert_eq!(venue.count(ContractRole::FrontRun), 1);
    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.halted());
    assert_eq!(outcome.executed_by(), None);
}

#[tokio::test]
async fn chain_stops_after_rejected_front_run() {
    let venue = Arc::new(RecordingVenue::new(SimulatedResponses {
        front_run_accepted: false,
        ..SimulatedResponses::default()
    }));

    let outcome = full_chain(venue.clone())
        .evaluate(&eligible_everywhere(), &CancellationToken::new())
        .await;

    assert_eq!(venue.count(ContractRole::FrontRun), 1);
    assert_eq!(outcome.records.len(), 1);
    assert!(!outcome.halted());
    assert!(matches!(
        &outcome.records[0],
        DecisionRecord::Decided { result, .. } if result.reason == DecisionReason::ActionFailed
    ));
}

#[tokio::test]
async fn cancelled_batch_issues_nothing() {
    let venue = Arc::new(RecordingVenue::default().with_delay(Duration::from_millis(100)));
    let chain = StrategyChain::from_order(
        &[StrategyKind::Aggressive],
        &StrategyBindings::from_venue(venue.clone()),
        &ThresholdConfig::default(),
        RuntimeConfig::default(),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let txs: Vec<Transaction> = (0..N).map(tx).collect();
    let outcomes = chain.evaluate_batch(&txs, &cancel).await;

    assert!(outcomes.iter().all(|o| o.halted()));
    assert_eq!(venue.count(ContractRole::FrontRun), 0);
}
