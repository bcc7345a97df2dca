//! Persistence surface: merchant, result, and strategy stores plus the
//! feedback sink.
//!
//! Portable trait surfaces; the SQLite implementation lives in the sibling
//! files and is exposed as the unit struct [`SqliteStore`]. Connections are
//! passed per call so callers control transaction scope.

mod feedback;
mod merchants;
mod results;
mod strategies;

use std::collections::BTreeSet;

use diesel::SqliteConnection;

use crate::{
    error::EngineResult,
    kind::AnalysisKind,
    models::{
        analysis::{AnalysisResultRow, NewAnalysisResult},
        feedback::{FeedbackAction, FeedbackRow},
        merchant::{MerchantRow, MetricsUpdate, NewMerchant},
        strategy::{NewStrategy, StrategyRow, StrategyStatus},
    },
};

/// SQLite implementation of every store trait in this module.
pub struct SqliteStore;

impl SqliteStore {
    /// Creates the store; it carries no state of its own.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SqliteStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Access to merchant rows.
pub trait MerchantStore {
    /// Registers a new merchant.
    fn insert_merchant(
        &self,
        conn: &mut SqliteConnection,
        row: &NewMerchant<'_>,
    ) -> EngineResult<MerchantRow>;

    /// Fetches a merchant by external code; `NotFound` if absent.
    fn merchant_by_code(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
    ) -> EngineResult<MerchantRow>;

    /// Fetches a merchant by primary key; `NotFound` if absent.
    fn merchant_by_id(&self, conn: &mut SqliteConnection, id: i32) -> EngineResult<MerchantRow>;

    /// Applies a metric sync, stamping `metrics_synced_at`.
    fn update_metrics(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
        update: &MetricsUpdate<'_>,
    ) -> EngineResult<MerchantRow>;

    /// Stores (or clears) the email-marketing integration credential.
    fn set_dispatch_api_key(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
        api_key: Option<&str>,
    ) -> EngineResult<()>;
}

/// Access to cached analysis results.
pub trait ResultStore {
    /// The current result of one kind for one merchant, if any.
    fn latest_result(
        &self,
        conn: &mut SqliteConnection,
        merchant_id: i32,
        kind: AnalysisKind,
    ) -> EngineResult<Option<AnalysisResultRow>>;

    /// Writes a freshly computed result, replacing any prior result of the
    /// same kind for the merchant (last-write-wins, no history).
    fn upsert_result(
        &self,
        conn: &mut SqliteConnection,
        row: &NewAnalysisResult<'_>,
    ) -> EngineResult<AnalysisResultRow>;
}

/// Access to strategy rows, including the guarded status writes.
pub trait StrategyStore {
    /// Inserts a freshly generated strategy.
    fn insert_strategy(
        &self,
        conn: &mut SqliteConnection,
        row: &NewStrategy<'_>,
    ) -> EngineResult<StrategyRow>;

    /// Fetches a strategy by external code; `NotFound` if absent.
    fn strategy_by_code(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
    ) -> EngineResult<StrategyRow>;

    /// Lists a merchant's strategies by descending priority, optionally
    /// filtered by status.
    fn list_strategies(
        &self,
        conn: &mut SqliteConnection,
        merchant_id: i32,
        status: Option<StrategyStatus>,
        limit: i64,
    ) -> EngineResult<Vec<StrategyRow>>;

    /// The strategy types a merchant currently has in a non-terminal status.
    /// Regeneration must not duplicate or discard these.
    fn in_flight_types(
        &self,
        conn: &mut SqliteConnection,
        merchant_id: i32,
    ) -> EngineResult<BTreeSet<String>>;

    /// Compare-and-set: recommended -> active, stamping `implemented_at`.
    /// Returns `None` when the current status is not `recommended`.
    fn activate(&self, conn: &mut SqliteConnection, id: i32)
    -> EngineResult<Option<StrategyRow>>;

    /// Compare-and-set: recommended/active -> dismissed. Returns `None` when
    /// the current status is already terminal.
    fn dismiss(&self, conn: &mut SqliteConnection, id: i32) -> EngineResult<Option<StrategyRow>>;

    /// Compare-and-set: active -> completed, recording the realized ROI and
    /// stamping `completed_at`. Returns `None` when the strategy is not
    /// active.
    fn complete(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        actual_roi: f64,
    ) -> EngineResult<Option<StrategyRow>>;

    /// Records a successful dispatch (remote id + `deployed_at`) without
    /// touching the status.
    fn record_deployment(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        remote_campaign_id: Option<&str>,
    ) -> EngineResult<StrategyRow>;
}

/// Append-only feedback recording.
pub trait FeedbackSink {
    /// Appends one feedback record for a strategy.
    fn record_feedback(
        &self,
        conn: &mut SqliteConnection,
        strategy_id: i32,
        action: FeedbackAction,
        comment: Option<&str>,
    ) -> EngineResult<FeedbackRow>;

    /// All feedback for a strategy, oldest first.
    fn feedback_for_strategy(
        &self,
        conn: &mut SqliteConnection,
        strategy_id: i32,
    ) -> EngineResult<Vec<FeedbackRow>>;
}
