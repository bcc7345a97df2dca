use diesel::connection::SimpleConnection;
use diesel::prelude::*;

mod common;

#[test]
fn schema_comes_up_with_working_defaults() {
    let (_db, mut conn) = common::setup_db();

    conn.batch_execute(
        "INSERT INTO merchants (merchant_code, shop_name, vertical) \
         VALUES ('MCH_A', 'Shop A', 'apparel')",
    )
    .unwrap();

    // Timestamp defaults come from the schema, RFC3339 with millis.
    let created: String = diesel::sql_query("SELECT created_at FROM merchants")
        .get_result::<CreatedAt>(&mut conn)
        .unwrap()
        .created_at;
    assert!(created.ends_with('Z') && created.contains('T'), "got {created}");
}

#[derive(QueryableByName)]
struct CreatedAt {
    #[diesel(sql_type = diesel::sql_types::Text)]
    created_at: String,
}

#[test]
fn status_and_kind_check_constraints_hold() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_A");

    // An unknown analysis kind is rejected by the CHECK constraint.
    let bad_kind = conn.batch_execute(&format!(
        "INSERT INTO analysis_results (merchant_id, kind, payload, computed_at) \
         VALUES ({}, 'sentiment', '{{}}', '2025-06-01T00:00:00.000Z')",
        merchant.id
    ));
    assert!(bad_kind.is_err());

    // An unknown strategy status is rejected too.
    let bad_status = conn.batch_execute(&format!(
        "INSERT INTO strategies \
         (strategy_code, merchant_id, name, strategy_type, description, status) \
         VALUES ('STRAT_X', {}, 'X', 'x', 'x', 'approved')",
        merchant.id
    ));
    assert!(bad_status.is_err());
}

#[test]
fn deleting_a_merchant_cascades_to_children() {
    let (_db, mut conn) = common::setup_db();
    let merchant = common::seed_merchant(&mut conn, "MCH_A");
    common::seed_strategy(&mut conn, merchant.id, "STRAT_A");

    conn.batch_execute(&format!("DELETE FROM merchants WHERE id = {}", merchant.id))
        .unwrap();

    use diesel::dsl::count_star;
    use growth_engine::schema::strategies::dsl as s;
    let remaining: i64 = s::strategies.select(count_star()).first(&mut conn).unwrap();
    assert_eq!(remaining, 0);
}
