//! Peer-group aggregates: the comparison population for percentile scoring.
//!
//! This module defines the [`PeerAggregateProvider`] trait, a unified surface
//! for fetching a peer group's aggregate statistics, and the machinery that
//! keeps the local `peer_benchmarks` table in sync with an externally
//! produced seed file (see [`sync`]).
//!
//! The engine only ever reads aggregates; the external batch process that
//! computes them is out of scope and is represented by the seed sync.

pub mod provider;
pub mod seed;
pub mod sync;

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::scoring::ScoringConfig;

/// Errors that can occur while looking up peer aggregates.
#[derive(Debug, Error)]
pub enum PeerError {
    /// No aggregate rows exist for the requested group key.
    #[error("no peer aggregates for group `{0}`")]
    UnknownGroup(String),

    /// A stored sample column failed to parse as a JSON number array.
    #[error("stored sample for `{group}/{metric}` is not valid JSON: {source}")]
    MalformedSample {
        /// Group key of the corrupt row.
        group: String,
        /// Metric name of the corrupt row.
        metric: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// An underlying database operation failed.
    #[error(transparent)]
    Db(#[from] diesel::result::Error),
}

/// Segmentation key identifying one peer group: vertical plus size bracket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerKey {
    /// Vertical/category code, normalized lowercase.
    pub vertical: String,
    /// Size bracket code, normalized lowercase.
    pub bracket: String,
}

impl PeerKey {
    /// Builds a key from raw parts, normalizing both.
    pub fn new(vertical: &str, bracket: &str) -> Self {
        PeerKey {
            vertical: vertical.trim().to_lowercase(),
            bracket: bracket.trim().to_lowercase(),
        }
    }

    /// Derives a merchant's peer key from its vertical and revenue, using the
    /// configured size brackets.
    pub fn for_merchant(vertical: &str, monthly_revenue: f64, cfg: &ScoringConfig) -> Self {
        PeerKey::new(vertical, &cfg.bracket_for(monthly_revenue).name)
    }
}

impl std::fmt::Display for PeerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.vertical, self.bracket)
    }
}

/// Aggregate statistics of one metric within a peer group.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricAggregate {
    /// 25th percentile cut point.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile cut point.
    pub p75: f64,
    /// Sorted peer observations; empty when only cut points are known.
    pub sample: Vec<f64>,
}

/// The full aggregate set of a peer group, keyed by metric name.
pub type PeerAggregates = IndexMap<String, MetricAggregate>;

/// Portable surface; the SQLite implementation lives in [`provider`].
pub trait PeerAggregateProvider {
    /// Fetches the aggregate statistics for one peer group.
    ///
    /// A missing group is an error, not an empty map: the orchestrator must
    /// surface it instead of scoring against nothing.
    fn aggregates(
        &self,
        conn: &mut diesel::SqliteConnection,
        key: &PeerKey,
    ) -> Result<PeerAggregates, PeerError>;
}
