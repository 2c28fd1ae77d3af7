//! End-to-end strategy behaviour against the recording venue.

use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use frontrun::config::{RuntimeConfig, ThresholdConfig};
use frontrun::contracts::simulated::SimulatedResponses;
use frontrun::strategy::{build_strategy, Strategy, StrategyBindings};
use frontrun::types::*;

use crate::mock_contracts::RecordingVenue;

fn thresholds(extra: &[(&str, f64)]) -> ThresholdConfig {
    let mut pairs = vec![("ADVANCED_FRONT_RUN_MIN_VOLUME", 10_000.0)];
    pairs.extend_from_slice(extra);
    ThresholdConfig::from_pairs(pairs).unwrap()
}

fn build(
    kind: StrategyKind,
    venue: &Arc<RecordingVenue>,
    thresholds: &ThresholdConfig,
) -> Arc<dyn Strategy> {
    build_strategy(
        kind,
        &StrategyBindings::from_venue(venue.clone()),
        thresholds,
        RuntimeConfig::default(),
    )
    .unwrap()
}

fn full_tx(id: &str) -> Transaction {
    Transaction::new(id)
        .with_token("MOCK_TOKEN")
        .with_history(vec![10.0, 10.4, 9.7, 10.9])
}

#[tokio::test]
async fn invalid_transaction_never_scores_or_acts() {
    for kind in StrategyKind::ALL {
        let venue = Arc::new(RecordingVenue::new(SimulatedResponses {
            valid: false,
            ..SimulatedResponses::default()
        }));
        let strategy = build(*kind, &venue, &thresholds(&[]));

        let result = assert_ok!(strategy.execute(&full_tx("0xbad")).await);
        assert_eq!(result, DecisionResult::skipped_invalid(), "{kind}");
        assert_eq!(venue.calls_for("0xbad"), vec![ContractRole::Validate], "{kind}");
        assert_eq!(venue.calls().len(), 1, "{kind}");
    }
}

#[tokio::test]
async fn failing_validator_is_treated_as_invalid() {
    let venue = Arc::new(RecordingVenue::default());
    venue.fail(ContractRole::Validate);
    let strategy = build(StrategyKind::Aggressive, &venue, &thresholds(&[]));

    let result = assert_ok!(strategy.execute(&full_tx("0x1")).await);
    assert_eq!(result.reason, DecisionReason::SkippedInvalid);
    assert_eq!(venue.count(ContractRole::RiskScore), 0);
}

#[tokio::test]
async fn aggressive_threshold_is_strict() {
    let cfg = thresholds(&[("AGGRESSIVE_FRONT_RUN_RISK_SCORE_THRESHOLD", 70.0)]);

    let at_threshold = Arc::new(RecordingVenue::new(SimulatedResponses {
        risk_score: 70.0,
        ..SimulatedResponses::default()
    }));
    let result = assert_ok!(
        build(StrategyKind::Aggressive, &at_threshold, &cfg)
            .execute(&full_tx("0x1"))
            .await
    );
    assert_eq!(result.reason, DecisionReason::BelowThreshold);
    assert_eq!(at_threshold.count(ContractRole::FrontRun), 0);

    let just_above = Arc::new(RecordingVenue::new(SimulatedResponses {
        risk_score: 70.0 + 1e-6,
        ..SimulatedResponses::default()
    }));
    let result = assert_ok!(
        build(StrategyKind::Aggressive, &just_above, &cfg)
            .execute(&full_tx("0x1"))
            .await
    );
    assert_eq!(result, DecisionResult::executed());
    assert_eq!(
        just_above.calls_for("0x1"),
        vec![
            ContractRole::Validate,
            ContractRole::RiskScore,
            ContractRole::FrontRun
        ]
    );
}

#[tokio::test]
async fn inclusive_mode_accepts_equality() {
    let venue = Arc::new(RecordingVenue::new(SimulatedResponses {
        risk_score: 70.0,
        ..SimulatedResponses::default()
    }));
    let cfg = thresholds(&[("THRESHOLD_COMPARISON_INCLUSIVE", 1.0)]);
    let result = assert_ok!(
        build(StrategyKind::Aggressive, &venue, &cfg)
            .execute(&full_tx("0x1"))
            .await
    );
    assert!(result.executed);
}

#[tokio::test]
async fn predictive_needs_both_signals() {
    let venue = Arc::new(RecordingVenue::new(SimulatedResponses {
        predicted_movement: 0.2,
        opportunity_score: 99.0,
        ..SimulatedResponses::default()
    }));
    let strategy = build(StrategyKind::Predictive, &venue, &thresholds(&[]));

    let result = assert_ok!(strategy.execute(&full_tx("0x1")).await);
    assert!(!result.executed);
    assert_eq!(
        result.reason,
        DecisionReason::ConditionsUnmet(UnmetCause::Predicate)
    );
    assert_eq!(venue.count(ContractRole::FrontRun), 0);
}

#[tokio::test]
async fn volatility_without_history_is_unmet_not_error() {
    let venue = Arc::new(RecordingVenue::default());
    let strategy = build(StrategyKind::Volatility, &venue, &thresholds(&[]));

    let result = assert_ok!(strategy.execute(&Transaction::new("0x1")).await);
    assert_eq!(
        result.reason,
        DecisionReason::ConditionsUnmet(UnmetCause::InsufficientData)
    );
    assert_eq!(venue.calls_for("0x1"), vec![ContractRole::Validate]);
}

#[tokio::test]
async fn advanced_three_of_four() {
    let bearish = || {
        Arc::new(RecordingVenue::new(SimulatedResponses {
            conditions: MarketConditions::new(MarketTrend::Bearish),
            ..SimulatedResponses::default()
        }))
    };

    let venue = bearish();
    let result = assert_ok!(
        build(StrategyKind::Advanced, &venue, &thresholds(&[]))
            .execute(&full_tx("0x1"))
            .await
    );
    assert!(!result.executed);
    assert_eq!(venue.count(ContractRole::FrontRun), 0);

    let venue = bearish();
    let cfg = thresholds(&[("ADVANCED_FRONT_RUN_REQUIRED_CONDITIONS", 3.0)]);
    let result = assert_ok!(
        build(StrategyKind::Advanced, &venue, &cfg)
            .execute(&full_tx("0x1"))
            .await
    );
    assert!(result.executed);
    assert_eq!(venue.count(ContractRole::FrontRun), 1);
}

#[tokio::test]
async fn advanced_absorbs_failing_sources() {
    let venue = Arc::new(RecordingVenue::default());
    venue.fail(ContractRole::TokenVolume);
    let cfg = thresholds(&[("ADVANCED_FRONT_RUN_REQUIRED_CONDITIONS", 3.0)]);

    let result = assert_ok!(
        build(StrategyKind::Advanced, &venue, &cfg)
            .execute(&full_tx("0x1"))
            .await
    );
    assert!(result.executed);
    assert_eq!(venue.count(ContractRole::TokenVolume), 1);
}

#[tokio::test]
async fn identical_instances_decide_identically() {
    let venue = Arc::new(RecordingVenue::default());
    let cfg = thresholds(&[("AGGRESSIVE_FRONT_RUN_RISK_SCORE_THRESHOLD", 50.0)]);
    let first = build(StrategyKind::Aggressive, &venue, &cfg);
    let second = build(StrategyKind::Aggressive, &venue, &cfg);

    for risk in [10.0, 49.9, 50.0, 50.1, 90.0] {
        let tx = Transaction::new("0xsame").with_payload(serde_json::json!({ "risk": risk }));
        let a = assert_ok!(first.execute(&tx).await);
        let b = assert_ok!(second.execute(&tx).await);
        assert_eq!(a, b, "risk {risk}");
    }
}

#[tokio::test]
async fn front_run_error_is_surfaced() {
    let venue = Arc::new(RecordingVenue::default());
    venue.fail(ContractRole::FrontRun);
    let strategy = build(StrategyKind::Aggressive, &venue, &thresholds(&[]));

    let err = assert_err!(strategy.execute(&full_tx("0x1")).await);
    assert!(matches!(err, ExecutionError::ActionFailure(_)));
    assert_eq!(venue.count(ContractRole::FrontRun), 1);
}

#[tokio::test]
async fn empty_id_rejected_before_any_call() {
    let venue = Arc::new(RecordingVenue::default());
    let strategy = build(StrategyKind::Predictive, &venue, &thresholds(&[]));

    let err = assert_err!(strategy.execute(&Transaction::new("")).await);
    assert!(matches!(err, ExecutionError::InvalidInput(_)));
    assert!(venue.calls().is_empty());
}

#[tokio::test]
async fn cancellation_during_scoring_prevents_action() {
    let venue = Arc::new(RecordingVenue::default().with_delay(Duration::from_millis(200)));
    let strategy = build(StrategyKind::Aggressive, &venue, &thresholds(&[]));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let err = assert_err!(
        strategy
            .execute_with_cancel(&full_tx("0x1"), &cancel)
            .await
    );
    assert!(matches!(err, ExecutionError::Cancelled));
    assert_eq!(venue.count(ContractRole::FrontRun), 0);
}

#[tokio::test]
async fn per_call_timeout_bounds_each_call() {
    let venue = Arc::new(RecordingVenue::default().with_delay(Duration::from_millis(200)));
    let strategy = build_strategy(
        StrategyKind::Predictive,
        &StrategyBindings::from_venue(venue.clone()),
        &thresholds(&[]),
        RuntimeConfig::with_timeout(Duration::from_millis(500)),
    )
    .unwrap();

    // Each call finishes inside its own limit even though the total exceeds it.
    let result = assert_ok!(strategy.execute(&full_tx("0x1")).await);
    assert!(result.executed);

    let slow = Arc::new(RecordingVenue::default().with_delay(Duration::from_millis(300)));
    let strategy = build_strategy(
        StrategyKind::Volatility,
        &StrategyBindings::from_venue(slow.clone()),
        &thresholds(&[]),
        RuntimeConfig::with_timeout(Duration::from_millis(50)),
    )
    .unwrap();
    let result = assert_ok!(strategy.execute(&full_tx("0x2")).await);
    assert_eq!(result.reason, DecisionReason::SkippedInvalid);
    assert_eq!(slow.count(ContractRole::VolatilityScore), 0);
}
