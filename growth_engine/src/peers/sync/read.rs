//! Current DB state, read for diffing and pruning.

use std::collections::BTreeMap;

use diesel::prelude::*;

use crate::peers::sync::want::WantedRow;

/// Current rows keyed by (group_key, metric), in the same shape as the
/// desired state so the diff is a direct comparison.
#[derive(Debug, Default)]
pub struct Current {
    /// Every row the table currently holds.
    pub rows: BTreeMap<(String, String), WantedRow>,
}

/// Loads every benchmark row currently stored.
pub fn read_current(conn: &mut SqliteConnection) -> diesel::QueryResult<Current> {
    use crate::schema::peer_benchmarks::dsl as pb;

    let rows: Vec<(String, String, f64, f64, f64, String)> = pb::peer_benchmarks
        .select((pb::group_key, pb::metric, pb::p25, pb::p50, pb::p75, pb::sample))
        .load(conn)?;

    let mut out = BTreeMap::new();
    for (group_key, metric, p25, p50, p75, sample_json) in rows {
        out.insert(
            (group_key, metric),
            WantedRow {
                p25,
                p50,
                p75,
                sample_json,
            },
        );
    }
    Ok(Current { rows: out })
}
