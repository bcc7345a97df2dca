//! Analysis result rows: the cached output of an analyze call.

use diesel::prelude::*;

use crate::schema::analysis_results;

/// A row in [`crate::schema::analysis_results`]: the single current result of
/// one analysis kind for one merchant.
///
/// New computations overwrite the row in place (last-write-wins); the table
/// never accumulates history.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable)]
#[diesel(table_name = analysis_results, check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalysisResultRow {
    /// Database primary key.
    pub id: i32,
    /// FK to [`crate::models::merchant::MerchantRow`].
    pub merchant_id: i32,
    /// Kind discriminator: "discovery" or "benchmark".
    pub kind: String,
    /// Serialized payload (JSON) — see [`crate::scoring::payload`].
    pub payload: String,
    /// Version tag of the scoring configuration used to compute the payload.
    pub config_version: Option<String>,
    /// When the payload was computed (RFC3339 UTC). A result is stale when
    /// this is older than the merchant's `metrics_synced_at`.
    pub computed_at: String,
}

/// Insertable/changeset form of [`AnalysisResultRow`], used for the
/// compute-and-overwrite upsert.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = analysis_results)]
pub struct NewAnalysisResult<'a> {
    /// FK to the owning merchant.
    pub merchant_id: i32,
    /// Kind discriminator: "discovery" or "benchmark".
    pub kind: &'a str,
    /// Serialized payload (JSON).
    pub payload: &'a str,
    /// Version tag of the scoring configuration.
    pub config_version: Option<&'a str>,
    /// Computation timestamp (RFC3339 UTC).
    pub computed_at: &'a str,
}
