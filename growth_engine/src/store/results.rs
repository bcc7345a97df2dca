use diesel::prelude::*;

use crate::{
    error::EngineResult,
    kind::AnalysisKind,
    models::analysis::{AnalysisResultRow, NewAnalysisResult},
    schema::analysis_results,
    store::{ResultStore, SqliteStore},
};

impl ResultStore for SqliteStore {
    fn latest_result(
        &self,
        conn: &mut SqliteConnection,
        merchant_id_v: i32,
        kind_v: AnalysisKind,
    ) -> EngineResult<Option<AnalysisResultRow>> {
        use analysis_results::dsl as ar;

        let row = ar::analysis_results
            .filter(ar::merchant_id.eq(merchant_id_v))
            .filter(ar::kind.eq(kind_v.as_str()))
            .select(AnalysisResultRow::as_select())
            .first(conn)
            .optional()?;
        Ok(row)
    }

    fn upsert_result(
        &self,
        conn: &mut SqliteConnection,
        row: &NewAnalysisResult<'_>,
    ) -> EngineResult<AnalysisResultRow> {
        use analysis_results::dsl as ar;

        // Insert .. ON CONFLICT (merchant_id, kind) DO UPDATE .. RETURNING *
        // (SQLite 3.35+): the one-current-result-per-kind contract in a
        // single atomic statement.
        let stored = diesel::insert_into(ar::analysis_results)
            .values(row)
            .on_conflict((ar::merchant_id, ar::kind))
            .do_update()
            .set(row)
            .returning(AnalysisResultRow::as_returning())
            .get_result(conn)?;
        Ok(stored)
    }
}
