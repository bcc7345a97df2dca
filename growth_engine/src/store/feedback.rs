use diesel::prelude::*;

use crate::{
    error::EngineResult,
    models::feedback::{FeedbackAction, FeedbackRow, NewFeedback},
    schema::feedback_events,
    store::{FeedbackSink, SqliteStore},
};

impl FeedbackSink for SqliteStore {
    fn record_feedback(
        &self,
        conn: &mut SqliteConnection,
        strategy_id_v: i32,
        action_v: FeedbackAction,
        comment_v: Option<&str>,
    ) -> EngineResult<FeedbackRow> {
        use feedback_events::dsl as fe;

        let row = NewFeedback {
            strategy_id: strategy_id_v,
            action: action_v.as_str(),
            category: action_v.category(),
            comment: comment_v,
        };
        let stored = diesel::insert_into(fe::feedback_events)
            .values(&row)
            .returning(FeedbackRow::as_returning())
            .get_result(conn)?;
        Ok(stored)
    }

    fn feedback_for_strategy(
        &self,
        conn: &mut SqliteConnection,
        strategy_id_v: i32,
    ) -> EngineResult<Vec<FeedbackRow>> {
        use feedback_events::dsl as fe;

        let rows = fe::feedback_events
            .filter(fe::strategy_id.eq(strategy_id_v))
            .order(fe::id.asc())
            .select(FeedbackRow::as_select())
            .load(conn)?;
        Ok(rows)
    }
}
