use std::collections::BTreeSet;

use chrono::Utc;
use diesel::prelude::*;

use crate::{
    error::{EngineError, EngineResult},
    models::strategy::{NewStrategy, StrategyRow, StrategyStatus},
    schema::strategies,
    store::{SqliteStore, StrategyStore},
    time,
};

/// Guarded single-statement status write.
///
/// The `WHERE status IN (..)` clause is the compare half of the CAS; a
/// `None` return means the row moved (or never was) out of the expected
/// states between the caller's read and this write.
fn cas_status(
    conn: &mut SqliteConnection,
    id_v: i32,
    from: &[StrategyStatus],
    to: StrategyStatus,
) -> EngineResult<Option<StrategyRow>> {
    use strategies::dsl as s;

    let from_codes: Vec<&str> = from.iter().map(|f| f.as_str()).collect();
    let row = diesel::update(
        s::strategies.filter(s::id.eq(id_v).and(s::status.eq_any(from_codes))),
    )
    .set(s::status.eq(to.as_str()))
    .returning(StrategyRow::as_returning())
    .get_result(conn)
    .optional()?;
    Ok(row)
}

impl StrategyStore for SqliteStore {
    fn insert_strategy(
        &self,
        conn: &mut SqliteConnection,
        row: &NewStrategy<'_>,
    ) -> EngineResult<StrategyRow> {
        use strategies::dsl as s;

        let inserted = diesel::insert_into(s::strategies)
            .values(row)
            .returning(StrategyRow::as_returning())
            .get_result(conn)?;
        Ok(inserted)
    }

    fn strategy_by_code(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
    ) -> EngineResult<StrategyRow> {
        use strategies::dsl as s;

        s::strategies
            .filter(s::strategy_code.eq(code))
            .select(StrategyRow::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| EngineError::NotFound {
                entity: "strategy",
                id: code.to_string(),
            })
    }

    fn list_strategies(
        &self,
        conn: &mut SqliteConnection,
        merchant_id_v: i32,
        status_filter: Option<StrategyStatus>,
        limit: i64,
    ) -> EngineResult<Vec<StrategyRow>> {
        use strategies::dsl as s;

        let mut query = s::strategies
            .filter(s::merchant_id.eq(merchant_id_v))
            .select(StrategyRow::as_select())
            .into_boxed();
        if let Some(status_v) = status_filter {
            query = query.filter(s::status.eq(status_v.as_str()));
        }
        let rows = query
            .order(s::priority_score.desc())
            .limit(limit)
            .load(conn)?;
        Ok(rows)
    }

    fn in_flight_types(
        &self,
        conn: &mut SqliteConnection,
        merchant_id_v: i32,
    ) -> EngineResult<BTreeSet<String>> {
        use strategies::dsl as s;

        let types: Vec<String> = s::strategies
            .filter(s::merchant_id.eq(merchant_id_v))
            .filter(s::status.eq_any([
                StrategyStatus::Recommended.as_str(),
                StrategyStatus::Active.as_str(),
            ]))
            .select(s::strategy_type)
            .load(conn)?;
        Ok(types.into_iter().collect())
    }

    fn activate(
        &self,
        conn: &mut SqliteConnection,
        id_v: i32,
    ) -> EngineResult<Option<StrategyRow>> {
        use strategies::dsl as s;

        let now = time::to_rfc3339_millis(Utc::now());
        let row = diesel::update(s::strategies.filter(
            s::id.eq(id_v).and(s::status.eq(StrategyStatus::Recommended.as_str())),
        ))
        .set((
            s::status.eq(StrategyStatus::Active.as_str()),
            s::implemented_at.eq(Some(now)),
        ))
        .returning(StrategyRow::as_returning())
        .get_result(conn)
        .optional()?;
        Ok(row)
    }

    fn dismiss(&self, conn: &mut SqliteConnection, id_v: i32) -> EngineResult<Option<StrategyRow>> {
        cas_status(
            conn,
            id_v,
            &[StrategyStatus::Recommended, StrategyStatus::Active],
            StrategyStatus::Dismissed,
        )
    }

    fn complete(
        &self,
        conn: &mut SqliteConnection,
        id_v: i32,
        actual_roi_v: f64,
    ) -> EngineResult<Option<StrategyRow>> {
        use strategies::dsl as s;

        let now = time::to_rfc3339_millis(Utc::now());
        let row = diesel::update(
            s::strategies
                .filter(s::id.eq(id_v).and(s::status.eq(StrategyStatus::Active.as_str()))),
        )
        .set((
            s::status.eq(StrategyStatus::Completed.as_str()),
            s::actual_roi.eq(Some(actual_roi_v)),
            s::completed_at.eq(Some(now)),
        ))
        .returning(StrategyRow::as_returning())
        .get_result(conn)
        .optional()?;
        Ok(row)
    }

    fn record_deployment(
        &self,
        conn: &mut SqliteConnection,
        id_v: i32,
        remote_campaign_id_v: Option<&str>,
    ) -> EngineResult<StrategyRow> {
        use strategies::dsl as s;

        let now = time::to_rfc3339_millis(Utc::now());
        diesel::update(s::strategies.find(id_v))
            .set((
                s::remote_campaign_id.eq(remote_campaign_id_v),
                s::deployed_at.eq(Some(now)),
            ))
            .returning(StrategyRow::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| EngineError::NotFound {
                entity: "strategy",
                id: id_v.to_string(),
            })
    }
}
