//! Peer benchmark rows: aggregate statistics per peer group and metric.

use diesel::prelude::*;

use crate::schema::peer_benchmarks;

/// A row in [`crate::schema::peer_benchmarks`]: the aggregate statistics of
/// one metric within one peer group.
///
/// Read-only from the engine's perspective; written only by the seed sync.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = peer_benchmarks, check_for_backend(diesel::sqlite::Sqlite))]
pub struct PeerBenchmarkRow {
    /// Peer group key, "<vertical>:<size bracket>" (e.g., "apparel:small").
    pub group_key: String,
    /// Canonical metric name (e.g., "aov").
    pub metric: String,
    /// 25th percentile cut point.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile cut point.
    pub p75: f64,
    /// Sorted JSON array of peer observations ("[]" when absent).
    pub sample: String,
}

/// Insertable/changeset form of [`PeerBenchmarkRow`] used by the seed sync
/// upsert.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = peer_benchmarks)]
pub struct NewPeerBenchmark<'a> {
    /// Peer group key.
    pub group_key: &'a str,
    /// Canonical metric name.
    pub metric: &'a str,
    /// 25th percentile cut point.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile cut point.
    pub p75: f64,
    /// Sorted JSON array of peer observations.
    pub sample: &'a str,
}
