use growth_engine::error::EngineError;
use growth_engine::models::feedback::FeedbackAction;
use growth_engine::models::strategy::StrategyStatus;
use growth_engine::store::{FeedbackSink, SqliteStore, StrategyStore};
use growth_engine::strategy::lifecycle::{
    PredictionAccuracy, complete, dismiss, implement, record_feedback,
};

mod common;

#[test]
fn implement_activates_and_repeats_idempotently() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A");

    let store = SqliteStore::new();

    let row = implement(&mut conn, &store, "STRAT_A").expect("implement");
    assert_eq!(row.status_enum(), Some(StrategyStatus::Active));
    assert!(row.implemented_at.is_some());

    // Second implement is a no-op, not an error.
    let again = implement(&mut conn, &store, "STRAT_A").expect("repeat implement");
    assert_eq!(again.status_enum(), Some(StrategyStatus::Active));
    assert_eq!(again.implemented_at, row.implemented_at);
}

#[test]
fn completed_strategies_reject_further_transitions() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A");

    let store = SqliteStore::new();
    implement(&mut conn, &store, "STRAT_A").unwrap();
    complete(&mut conn, &store, "STRAT_A", 240.0).unwrap();

    // completed -> active is illegal.
    let err = implement(&mut conn, &store, "STRAT_A").unwrap_err();
    match err {
        EngineError::Conflict { status, action } => {
            assert_eq!(status, StrategyStatus::Completed);
            assert_eq!(action, "implemented");
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    // completed -> dismissed is illegal too; terminal states are final.
    let err = dismiss(&mut conn, &store, "STRAT_A").unwrap_err();
    assert!(matches!(err, EngineError::Conflict { .. }));
}

#[test]
fn dismiss_is_idempotent_and_blocks_reimplementation() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A");

    let store = SqliteStore::new();

    let row = dismiss(&mut conn, &store, "STRAT_A").expect("dismiss");
    assert_eq!(row.status_enum(), Some(StrategyStatus::Dismissed));

    let again = dismiss(&mut conn, &store, "STRAT_A").expect("repeat dismiss");
    assert_eq!(again.status_enum(), Some(StrategyStatus::Dismissed));

    let err = implement(&mut conn, &store, "STRAT_A").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict {
            status: StrategyStatus::Dismissed,
            ..
        }
    ));
}

#[test]
fn completing_an_unimplemented_strategy_is_a_conflict() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A");

    let store = SqliteStore::new();
    let err = complete(&mut conn, &store, "STRAT_A", 100.0).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict {
            status: StrategyStatus::Recommended,
            ..
        }
    ));
}

#[test]
fn completion_records_roi_and_grades_the_prediction() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A"); // expected_roi 250

    let store = SqliteStore::new();
    implement(&mut conn, &store, "STRAT_A").unwrap();

    let report = complete(&mut conn, &store, "STRAT_A", 240.0).expect("complete");
    assert_eq!(report.strategy.status_enum(), Some(StrategyStatus::Completed));
    assert_eq!(report.strategy.actual_roi, Some(240.0));
    assert!(report.strategy.completed_at.is_some());
    assert_eq!(report.accuracy, PredictionAccuracy::Excellent); // |−4%| < 10%
    assert!((report.variance_pct + 4.0).abs() < 1e-9);
}

#[test]
fn approve_feedback_activates_a_recommended_strategy() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A");

    let store = SqliteStore::new();

    let outcome = record_feedback(
        &mut conn,
        &store,
        "STRAT_A",
        FeedbackAction::Approve,
        Some("looks right for us"),
    )
    .expect("record feedback");

    assert_eq!(outcome.strategy.status_enum(), Some(StrategyStatus::Active));
    assert_eq!(outcome.record.action, "approve");
    assert_eq!(outcome.record.category, "positive");
    assert_eq!(outcome.record.comment.as_deref(), Some("looks right for us"));

    // Approve on an already-active strategy records but does not transition.
    let again = record_feedback(&mut conn, &store, "STRAT_A", FeedbackAction::Approve, None)
        .expect("repeat approve");
    assert_eq!(again.strategy.status_enum(), Some(StrategyStatus::Active));

    // Both records were appended.
    let records = store
        .feedback_for_strategy(&mut conn, outcome.strategy.id)
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn reject_feedback_forces_dismissal() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A");

    let store = SqliteStore::new();
    implement(&mut conn, &store, "STRAT_A").unwrap();

    let outcome = record_feedback(
        &mut conn,
        &store,
        "STRAT_A",
        FeedbackAction::Reject,
        Some("not our audience"),
    )
    .expect("record feedback");

    assert_eq!(outcome.strategy.status_enum(), Some(StrategyStatus::Dismissed));
    assert_eq!(outcome.record.category, "negative");
}

#[test]
fn feedback_on_a_completed_strategy_records_without_transition() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A");

    let store = SqliteStore::new();
    implement(&mut conn, &store, "STRAT_A").unwrap();
    complete(&mut conn, &store, "STRAT_A", 300.0).unwrap();

    let outcome = record_feedback(&mut conn, &store, "STRAT_A", FeedbackAction::Reject, None)
        .expect("record feedback");
    assert_eq!(outcome.strategy.status_enum(), Some(StrategyStatus::Completed));

    let records = store
        .feedback_for_strategy(&mut conn, outcome.strategy.id)
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn feedback_for_an_unknown_strategy_is_not_found() {
    let (_db, mut conn) = common::setup_db();
    let store = SqliteStore::new();

    let err = record_feedback(&mut conn, &store, "STRAT_NOPE", FeedbackAction::Approve, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { entity: "strategy", .. }));
}
