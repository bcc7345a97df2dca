//! Strategy rows and the status state machine they move through.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::strategies;

/// Lifecycle status of a strategy.
///
/// The ordering is monotonic: `recommended < active < {completed, dismissed}`.
/// [`StrategyStatus::can_transition`] is the single source of truth for legal
/// moves; there is no path out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyStatus {
    /// Freshly generated, awaiting a merchant decision.
    Recommended,
    /// The merchant chose to implement it; eligible for deploy.
    Active,
    /// The deployed campaign concluded (terminal).
    Completed,
    /// Rejected or dismissed by the merchant (terminal).
    Dismissed,
}

impl StrategyStatus {
    /// Stable storage code for the `strategies.status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyStatus::Recommended => "recommended",
            StrategyStatus::Active => "active",
            StrategyStatus::Completed => "completed",
            StrategyStatus::Dismissed => "dismissed",
        }
    }

    /// Parses a storage code back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recommended" => Some(StrategyStatus::Recommended),
            "active" => Some(StrategyStatus::Active),
            "completed" => Some(StrategyStatus::Completed),
            "dismissed" => Some(StrategyStatus::Dismissed),
            _ => None,
        }
    }

    /// Whether this status ends the lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, StrategyStatus::Completed | StrategyStatus::Dismissed)
    }

    /// The explicit transition table. Self-transitions are not listed here;
    /// the lifecycle layer treats them as idempotent no-ops where documented.
    pub fn can_transition(from: Self, to: Self) -> bool {
        use StrategyStatus::*;
        matches!(
            (from, to),
            (Recommended, Active)
                | (Recommended, Dismissed)
                | (Active, Completed)
                | (Active, Dismissed)
        )
    }
}

impl std::fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyStatus::parse(s).ok_or_else(|| format!("unknown strategy status: {s}"))
    }
}

/// A row in [`crate::schema::strategies`]: one generated recommendation.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable)]
#[diesel(table_name = strategies, check_for_backend(diesel::sqlite::Sqlite))]
pub struct StrategyRow {
    /// Database primary key.
    pub id: i32,
    /// Stable external identifier (e.g., "STRAT_9F3A11C0").
    pub strategy_code: String,
    /// FK to [`crate::models::merchant::MerchantRow`].
    pub merchant_id: i32,
    /// Human-readable name ("Welcome Series").
    pub name: String,
    /// Categorical type code ("welcome_series").
    pub strategy_type: String,
    /// What the strategy does and why it was recommended.
    pub description: String,
    /// Ranking score, higher first.
    pub priority_score: f64,
    /// Expected return on investment, percent.
    pub expected_roi: f64,
    /// Estimated incremental revenue.
    pub estimated_revenue: f64,
    /// Confidence in the recommendation, 0..1.
    pub confidence: f64,
    /// JSON array of implementation steps.
    pub action_steps: String,
    /// Effort level code: "low" | "medium" | "high".
    pub effort: String,
    /// Expected implementation timeline ("1-2 weeks").
    pub timeline: String,
    /// Whether the merchant met all eligibility gates at generation time.
    pub eligible: bool,
    /// Lifecycle status storage code; parse with [`StrategyStatus::parse`].
    pub status: String,
    /// Vendor-side campaign id recorded by a successful deploy.
    pub remote_campaign_id: Option<String>,
    /// When the strategy was last deployed (RFC3339 UTC).
    pub deployed_at: Option<String>,
    /// Realized ROI recorded at completion, percent.
    pub actual_roi: Option<f64>,
    /// When the strategy was implemented (RFC3339 UTC).
    pub implemented_at: Option<String>,
    /// When the strategy was completed (RFC3339 UTC).
    pub completed_at: Option<String>,
    /// Row creation timestamp (RFC3339 UTC).
    pub created_at: String,
    /// Row update timestamp (RFC3339 UTC, maintained by trigger).
    pub updated_at: String,
}

impl StrategyRow {
    /// The status column as a typed enum.
    ///
    /// The CHECK constraint makes an unparseable status unreachable through
    /// this crate's writes; `None` would mean outside tampering.
    pub fn status_enum(&self) -> Option<StrategyStatus> {
        StrategyStatus::parse(&self.status)
    }
}

/// Insertable form of [`StrategyRow`] produced by the generator.
#[derive(Debug, Insertable)]
#[diesel(table_name = strategies)]
pub struct NewStrategy<'a> {
    /// Stable external identifier.
    pub strategy_code: &'a str,
    /// FK to the owning merchant.
    pub merchant_id: i32,
    /// Human-readable name.
    pub name: &'a str,
    /// Categorical type code.
    pub strategy_type: &'a str,
    /// Description shown to the merchant.
    pub description: &'a str,
    /// Ranking score.
    pub priority_score: f64,
    /// Expected ROI, percent.
    pub expected_roi: f64,
    /// Estimated incremental revenue.
    pub estimated_revenue: f64,
    /// Confidence 0..1.
    pub confidence: f64,
    /// JSON array of implementation steps.
    pub action_steps: &'a str,
    /// Effort level code.
    pub effort: &'a str,
    /// Implementation timeline.
    pub timeline: &'a str,
    /// Eligibility at generation time.
    pub eligible: bool,
    /// Initial status storage code (always "recommended").
    pub status: &'a str,
}
