//! Status lifecycle operations: implement, dismiss, complete, feedback.
//!
//! Every status write goes through a compare-and-set on the current status
//! (see [`crate::store::StrategyStore`]), so interleaved feedback and
//! implement calls cannot lose updates. The explicit transition table lives
//! on [`StrategyStatus`]; this module maps CAS misses back to idempotent
//! no-ops or `Conflict` errors.

use diesel::Connection;
use diesel::SqliteConnection;
use tracing::info;

use crate::{
    error::{EngineError, EngineResult},
    models::{
        feedback::{FeedbackAction, FeedbackRow},
        strategy::{StrategyRow, StrategyStatus},
    },
    store::{FeedbackSink, StrategyStore},
};

/// How well the ROI prediction matched reality, by absolute variance bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionAccuracy {
    /// Variance under 10%.
    Excellent,
    /// Variance under 25%.
    Good,
    /// Variance under 50%.
    Fair,
    /// Variance of 50% or more.
    Poor,
}

impl PredictionAccuracy {
    /// Classifies a signed variance percentage.
    pub fn from_variance_pct(pct: f64) -> Self {
        let abs = pct.abs();
        if abs < 10.0 {
            PredictionAccuracy::Excellent
        } else if abs < 25.0 {
            PredictionAccuracy::Good
        } else if abs < 50.0 {
            PredictionAccuracy::Fair
        } else {
            PredictionAccuracy::Poor
        }
    }

    /// Lowercase label for logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            PredictionAccuracy::Excellent => "excellent",
            PredictionAccuracy::Good => "good",
            PredictionAccuracy::Fair => "fair",
            PredictionAccuracy::Poor => "poor",
        }
    }
}

/// Outcome of completing a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    /// The completed strategy row.
    pub strategy: StrategyRow,
    /// Signed variance of actual vs expected ROI, percent.
    pub variance_pct: f64,
    /// Variance band of the prediction.
    pub accuracy: PredictionAccuracy,
}

/// Outcome of recording feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackOutcome {
    /// The appended feedback record.
    pub record: FeedbackRow,
    /// The strategy row after any induced transition.
    pub strategy: StrategyRow,
}

fn current_status(row: &StrategyRow) -> EngineResult<StrategyStatus> {
    row.status_enum().ok_or_else(|| EngineError::Validation {
        field: "status",
        reason: format!("unrecognized stored status '{}'", row.status),
    })
}

/// Implements a strategy: recommended -> active.
///
/// Idempotent when already active (a repeat call returns the row unchanged,
/// not an error). Terminal states reject with `Conflict`.
pub fn implement<S: StrategyStore>(
    conn: &mut SqliteConnection,
    store: &S,
    strategy_code: &str,
) -> EngineResult<StrategyRow> {
    let row = store.strategy_by_code(conn, strategy_code)?;
    match current_status(&row)? {
        StrategyStatus::Active => Ok(row),
        StrategyStatus::Recommended => {
            if let Some(updated) = store.activate(conn, row.id)? {
                info!(strategy = %updated.strategy_code, "strategy implemented");
                return Ok(updated);
            }
            // Lost a race; decide from the fresh row.
            let fresh = store.strategy_by_code(conn, strategy_code)?;
            match current_status(&fresh)? {
                StrategyStatus::Active => Ok(fresh),
                status => Err(EngineError::Conflict {
                    status,
                    action: "implemented",
                }),
            }
        }
        status => Err(EngineError::Conflict {
            status,
            action: "implemented",
        }),
    }
}

/// Dismisses a strategy: recommended/active -> dismissed.
///
/// Idempotent when already dismissed; a completed strategy cannot be
/// dismissed (terminal states are final).
pub fn dismiss<S: StrategyStore>(
    conn: &mut SqliteConnection,
    store: &S,
    strategy_code: &str,
) -> EngineResult<StrategyRow> {
    let row = store.strategy_by_code(conn, strategy_code)?;
    match current_status(&row)? {
        StrategyStatus::Dismissed => Ok(row),
        StrategyStatus::Completed => Err(EngineError::Conflict {
            status: StrategyStatus::Completed,
            action: "dismissed",
        }),
        _ => {
            if let Some(updated) = store.dismiss(conn, row.id)? {
                info!(strategy = %updated.strategy_code, "strategy dismissed");
                return Ok(updated);
            }
            let fresh = store.strategy_by_code(conn, strategy_code)?;
            match current_status(&fresh)? {
                StrategyStatus::Dismissed => Ok(fresh),
                status => Err(EngineError::Conflict {
                    status,
                    action: "dismissed",
                }),
            }
        }
    }
}

/// Completes an active strategy, recording the realized ROI.
///
/// Completion is triggered externally (the deployed campaign concluded);
/// only `active` strategies can complete. The report compares realized
/// against expected ROI so prediction quality feeds back into review.
pub fn complete<S: StrategyStore>(
    conn: &mut SqliteConnection,
    store: &S,
    strategy_code: &str,
    actual_roi: f64,
) -> EngineResult<CompletionReport> {
    let row = store.strategy_by_code(conn, strategy_code)?;
    match current_status(&row)? {
        StrategyStatus::Active => {}
        status => {
            return Err(EngineError::Conflict {
                status,
                action: "completed",
            });
        }
    }

    let Some(strategy) = store.complete(conn, row.id, actual_roi)? else {
        let fresh = store.strategy_by_code(conn, strategy_code)?;
        return Err(EngineError::Conflict {
            status: current_status(&fresh)?,
            action: "completed",
        });
    };

    let variance_pct = if strategy.expected_roi > 0.0 {
        (actual_roi - strategy.expected_roi) / strategy.expected_roi * 100.0
    } else {
        0.0
    };
    let accuracy = PredictionAccuracy::from_variance_pct(variance_pct);

    info!(
        strategy = %strategy.strategy_code,
        actual_roi,
        accuracy = accuracy.as_str(),
        "strategy completed"
    );

    Ok(CompletionReport {
        strategy,
        variance_pct,
        accuracy,
    })
}

/// Records feedback and applies its induced transition, atomically.
///
/// The record is appended regardless of any transition. `approve` moves a
/// recommended strategy to active and nothing more; `reject` dismisses a
/// non-terminal strategy. Feedback on a terminal strategy is recorded
/// without a transition.
pub fn record_feedback<S>(
    conn: &mut SqliteConnection,
    store: &S,
    strategy_code: &str,
    action: FeedbackAction,
    comment: Option<&str>,
) -> EngineResult<FeedbackOutcome>
where
    S: StrategyStore + FeedbackSink,
{
    conn.immediate_transaction::<_, EngineError, _>(|conn| {
        let row = store.strategy_by_code(conn, strategy_code)?;
        let status = current_status(&row)?;

        let strategy = match (action, status) {
            (FeedbackAction::Approve, StrategyStatus::Recommended) => {
                store.activate(conn, row.id)?.unwrap_or(row)
            }
            (FeedbackAction::Reject, StrategyStatus::Recommended | StrategyStatus::Active) => {
                store.dismiss(conn, row.id)?.unwrap_or(row)
            }
            _ => row,
        };

        let record = store.record_feedback(conn, strategy.id, action, comment)?;

        info!(
            strategy = %strategy.strategy_code,
            action = action.as_str(),
            status = %strategy.status,
            "feedback recorded"
        );

        Ok(FeedbackOutcome { record, strategy })
    })
}
