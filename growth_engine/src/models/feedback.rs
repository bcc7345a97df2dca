//! Append-only human feedback records.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::feedback_events;

/// The two feedback actions a merchant can take on a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAction {
    /// The merchant endorses the recommendation.
    Approve,
    /// The merchant rejects the recommendation; forces dismissal.
    Reject,
}

impl FeedbackAction {
    /// Stable storage code for the `feedback_events.action` column.
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackAction::Approve => "approve",
            FeedbackAction::Reject => "reject",
        }
    }

    /// Sentiment bucket recorded alongside the action.
    pub fn category(self) -> &'static str {
        match self {
            FeedbackAction::Approve => "positive",
            FeedbackAction::Reject => "negative",
        }
    }
}

impl std::str::FromStr for FeedbackAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(FeedbackAction::Approve),
            "reject" => Ok(FeedbackAction::Reject),
            other => Err(format!("unknown feedback action: {other}")),
        }
    }
}

/// A row in [`crate::schema::feedback_events`]. Append-only; a strategy may
/// accumulate many, but only the most recent materially affects status.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable)]
#[diesel(table_name = feedback_events, check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeedbackRow {
    /// Database primary key.
    pub id: i32,
    /// FK to [`crate::models::strategy::StrategyRow`].
    pub strategy_id: i32,
    /// Action storage code: "approve" | "reject".
    pub action: String,
    /// Sentiment bucket: "positive" | "negative".
    pub category: String,
    /// Optional free-text comment from the merchant.
    pub comment: Option<String>,
    /// Row creation timestamp (RFC3339 UTC).
    pub created_at: String,
}

/// Insertable form of [`FeedbackRow`].
#[derive(Debug, Insertable)]
#[diesel(table_name = feedback_events)]
pub struct NewFeedback<'a> {
    /// FK to the strategy receiving feedback.
    pub strategy_id: i32,
    /// Action storage code.
    pub action: &'a str,
    /// Sentiment bucket.
    pub category: &'a str,
    /// Optional free-text comment.
    pub comment: Option<&'a str>,
}
