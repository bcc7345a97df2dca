#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use std::path::PathBuf;
use tempfile::TempDir;

use growth_engine::db::{connection, migrate};
use growth_engine::models::merchant::{MerchantRow, MetricsUpdate, NewMerchant};
use growth_engine::models::peer::NewPeerBenchmark;
use growth_engine::models::strategy::{NewStrategy, StrategyRow};
use growth_engine::store::{MerchantStore, SqliteStore, StrategyStore};
use growth_engine::time;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

/// Registers a merchant and syncs a healthy default metric set. Revenue of
/// 25k in the "apparel" vertical resolves to peer group "apparel:mid".
pub fn seed_merchant(conn: &mut SqliteConnection, code: &str) -> MerchantRow {
    let store = SqliteStore::new();
    store
        .insert_merchant(
            conn,
            &NewMerchant {
                merchant_code: code,
                shop_name: "Test Shop",
                vertical: "apparel",
            },
        )
        .expect("insert merchant");

    sync_metrics(conn, code, 2025, 6, 1)
}

/// Applies a metric sync stamped at the given date (UTC midnight).
pub fn sync_metrics(
    conn: &mut SqliteConnection,
    code: &str,
    year: i32,
    month: u32,
    day: u32,
) -> MerchantRow {
    let store = SqliteStore::new();
    let stamp = time::to_rfc3339_millis(Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap());
    store
        .update_metrics(
            conn,
            code,
            &MetricsUpdate {
                monthly_revenue: 25_000.0,
                total_customers: 800,
                total_orders: 1_900,
                aov: 200.0,
                repeat_purchase_rate: 2.4,
                ltv: 210.0,
                customer_acquisition_cost: 18.0,
                email_subscriber_count: 4_200,
                discount_frequency: 0.22,
                campaign_engagement: 0.19,
                metrics_synced_at: &stamp,
            },
        )
        .expect("sync metrics")
}

/// One peer benchmark row.
pub fn seed_peer_row(
    conn: &mut SqliteConnection,
    group_key: &str,
    metric: &str,
    p25: f64,
    p50: f64,
    p75: f64,
    sample: &[f64],
) {
    use growth_engine::schema::peer_benchmarks::dsl as pb;

    let sample_json = serde_json::to_string(sample).unwrap();
    let row = NewPeerBenchmark {
        group_key,
        metric,
        p25,
        p50,
        p75,
        sample: &sample_json,
    };
    diesel::insert_into(pb::peer_benchmarks)
        .values(&row)
        .on_conflict((pb::group_key, pb::metric))
        .do_update()
        .set(&row)
        .execute(conn)
        .expect("seed peer row");
}

/// Seeds all four tracked metrics for "apparel:mid". The AOV sample is laid
/// out so percentile(200) = 90.
pub fn seed_peers_default(conn: &mut SqliteConnection) {
    seed_peer_row(
        conn,
        "apparel:mid",
        "aov",
        50.0,
        100.0,
        180.0,
        &[40.0, 60.0, 80.0, 95.0, 110.0, 130.0, 150.0, 170.0, 190.0, 400.0],
    );
    seed_peer_row(conn, "apparel:mid", "ltv", 100.0, 200.0, 320.0, &[]);
    seed_peer_row(conn, "apparel:mid", "repeat_purchase_rate", 1.2, 2.0, 3.0, &[]);
    seed_peer_row(conn, "apparel:mid", "campaign_engagement", 0.08, 0.15, 0.24, &[]);
}

/// Inserts a recommended strategy directly, bypassing the generator.
pub fn seed_strategy(conn: &mut SqliteConnection, merchant_id: i32, code: &str) -> StrategyRow {
    let store = SqliteStore::new();
    store
        .insert_strategy(
            conn,
            &NewStrategy {
                strategy_code: code,
                merchant_id,
                name: "Abandoned Cart",
                strategy_type: "abandoned_cart",
                description: "Recover sales from abandoned shopping carts",
                priority_score: 83.33,
                expected_roi: 250.0,
                estimated_revenue: 4_166.67,
                confidence: 0.75,
                action_steps: r#"["Set up cart tracking","Create 2-3 reminder emails"]"#,
                effort: "medium",
                timeline: "1-2 weeks",
                eligible: true,
                status: "recommended",
            },
        )
        .expect("insert strategy")
}
