//! SQLite-backed peer aggregate provider.

use diesel::prelude::*;
use indexmap::IndexMap;

use crate::{
    models::peer::PeerBenchmarkRow,
    peers::{MetricAggregate, PeerAggregateProvider, PeerAggregates, PeerError, PeerKey},
};

/// Reads aggregates from the local `peer_benchmarks` table.
pub struct SqlitePeerProvider;

impl SqlitePeerProvider {
    /// Creates the provider; it carries no state of its own.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SqlitePeerProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerAggregateProvider for SqlitePeerProvider {
    fn aggregates(
        &self,
        conn: &mut SqliteConnection,
        key: &PeerKey,
    ) -> Result<PeerAggregates, PeerError> {
        use crate::schema::peer_benchmarks::dsl as pb;

        let rows: Vec<PeerBenchmarkRow> = pb::peer_benchmarks
            .filter(pb::group_key.eq(key.to_string()))
            .order(pb::metric.asc())
            .select(PeerBenchmarkRow::as_select())
            .load(conn)?;

        if rows.is_empty() {
            return Err(PeerError::UnknownGroup(key.to_string()));
        }

        let mut out: PeerAggregates = IndexMap::with_capacity(rows.len());
        for row in rows {
            let sample: Vec<f64> =
                serde_json::from_str(&row.sample).map_err(|source| PeerError::MalformedSample {
                    group: row.group_key.clone(),
                    metric: row.metric.clone(),
                    source,
                })?;
            out.insert(
                row.metric,
                MetricAggregate {
                    p25: row.p25,
                    p50: row.p50,
                    p75: row.p75,
                    sample,
                },
            );
        }
        Ok(out)
    }
}
