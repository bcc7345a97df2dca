use chrono::{TimeZone, Utc};
use indexmap::IndexMap;

use growth_engine::config::templates::TemplateCatalog;
use growth_engine::error::EngineError;
use growth_engine::kind::AnalysisKind;
use growth_engine::models::analysis::NewAnalysisResult;
use growth_engine::models::merchant::NewMerchant;
use growth_engine::models::strategy::StrategyStatus;
use growth_engine::scoring::payload::DiscoveryPayload;
use growth_engine::store::{MerchantStore, ResultStore, SqliteStore, StrategyStore};
use growth_engine::strategy::generate::generate;
use growth_engine::strategy::lifecycle::implement;
use growth_engine::time;

mod common;

#[test]
fn generation_ranks_by_descending_priority_and_respects_the_limit() {
    let (_db, mut conn) = common::setup_db();
    common::seed_merchant(&mut conn, "MCH_1");

    let store = SqliteStore::new();
    let catalog = TemplateCatalog::default();

    let rows = generate(&mut conn, &store, &catalog, "MCH_1", 3).expect("generate");
    assert_eq!(rows.len(), 3);
    assert!(
        rows.windows(2).all(|w| w[0].priority_score >= w[1].priority_score),
        "strategies must be ranked by descending priority"
    );
    for row in &rows {
        assert_eq!(row.status_enum(), Some(StrategyStatus::Recommended));
        assert!(row.strategy_code.starts_with("STRAT_"));
    }
}

#[test]
fn regeneration_keeps_in_flight_strategies_untouched() {
    let (_db, mut conn) = common::setup_db();
    common::seed_merchant(&mut conn, "MCH_1");

    let store = SqliteStore::new();
    let catalog = TemplateCatalog::default();

    let first = generate(&mut conn, &store, &catalog, "MCH_1", 2).expect("generate");
    let kept = &first[0];
    let active = implement(&mut conn, &store, &kept.strategy_code).expect("implement");

    let second = generate(&mut conn, &store, &catalog, "MCH_1", 8).expect("regenerate");

    // The active strategy is still there, unmodified.
    let reread = store.strategy_by_code(&mut conn, &active.strategy_code).unwrap();
    assert_eq!(reread.id, active.id);
    assert_eq!(reread.status_enum(), Some(StrategyStatus::Active));
    assert_eq!(reread.priority_score, active.priority_score);
    assert_eq!(reread.implemented_at, active.implemented_at);

    // And its type was not regenerated.
    assert!(
        second.iter().all(|row| row.strategy_type != active.strategy_type),
        "an in-flight type must not be regenerated"
    );
}

#[test]
fn generation_without_metrics_is_a_validation_error() {
    let (_db, mut conn) = common::setup_db();
    let store = SqliteStore::new();
    store
        .insert_merchant(
            &mut conn,
            &NewMerchant {
                merchant_code: "MCH_EMPTY",
                shop_name: "Empty Shop",
                vertical: "apparel",
            },
        )
        .unwrap();

    let catalog = TemplateCatalog::default();
    let err = generate(&mut conn, &store, &catalog, "MCH_EMPTY", 5).unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
}

#[test]
fn persona_and_benchmark_context_boost_matching_templates() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_1");

    let store = SqliteStore::new();
    let catalog = TemplateCatalog::default();

    // Plant a discovery result naming the Lifecycle Master persona and a
    // poor benchmark, both of which the generator consumes as context.
    let discovery = DiscoveryPayload {
        persona: "Lifecycle Master".into(),
        persona_confidence: 0.8,
        maturity_stage: "Growth".into(),
        maturity_confidence: 0.9,
        key_metrics: IndexMap::new(),
        characteristics: vec![],
        strengths: vec![],
        opportunities: vec![],
        next_stage_requirements: vec![],
    };
    let discovery_json = serde_json::to_string(&discovery).unwrap();
    let stamp = time::to_rfc3339_millis(Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
    store
        .upsert_result(
            &mut conn,
            &NewAnalysisResult {
                merchant_id: merchant.id,
                kind: AnalysisKind::Discovery.as_str(),
                payload: &discovery_json,
                config_version: Some("rules-v1"),
                computed_at: &stamp,
            },
        )
        .unwrap();

    let rows = generate(&mut conn, &store, &catalog, "MCH_1", 8).expect("generate");

    // welcome_series (ROI 180, affinity lifecycle_master) gets the 1.15
    // boost: 60 * 1.15 = 69.
    let welcome = rows
        .iter()
        .find(|r| r.strategy_type == "welcome_series")
        .expect("welcome_series generated");
    assert_eq!(welcome.priority_score, 69.0);

    // win_back (ROI 120, no affinity) stays at its base: 40.
    let win_back = rows
        .iter()
        .find(|r| r.strategy_type == "win_back")
        .expect("win_back generated");
    assert_eq!(win_back.priority_score, 40.0);
}

#[test]
fn eligibility_misses_penalize_but_do_not_hide_strategies() {
    let (_db, mut conn) = common::setup_db();
    common::seed_merchant(&mut conn, "MCH_1"); // 4,200 subscribers, 800 customers

    let store = SqliteStore::new();
    let mut catalog = TemplateCatalog::default();
    // Raise the bar so the merchant misses the welcome_series gate.
    catalog.templates["welcome_series"].eligibility.min_subscribers = Some(1_000_000);

    let rows = generate(&mut conn, &store, &catalog, "MCH_1", 8).expect("generate");
    let welcome = rows
        .iter()
        .find(|r| r.strategy_type == "welcome_series")
        .expect("ineligible strategies are still listed");
    assert!(!welcome.eligible);
    assert_eq!(welcome.confidence, 0.45);
    // 180/300*100 = 60, x0.3 penalty = 18.
    assert_eq!(welcome.priority_score, 18.0);
}
