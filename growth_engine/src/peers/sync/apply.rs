//! Applies a computed diff with idempotent UPSERTs and prune DELETEs.

use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};

use crate::{models::peer::NewPeerBenchmark, peers::sync::diff::PeerDiff, schema::peer_benchmarks};

/// Upserts every row in the diff and deletes the pruned ones.
///
/// Runs inside the caller's transaction; order does not matter because the
/// upsert and delete key sets are disjoint by construction.
pub fn apply_diff(conn: &mut SqliteConnection, diff: &PeerDiff) -> anyhow::Result<()> {
    use peer_benchmarks::dsl as pb;

    for ((group_key, metric), row) in &diff.upserts {
        let new_row = NewPeerBenchmark {
            group_key,
            metric,
            p25: row.p25,
            p50: row.p50,
            p75: row.p75,
            sample: &row.sample_json,
        };
        insert_into(pb::peer_benchmarks)
            .values(&new_row)
            .on_conflict((pb::group_key, pb::metric))
            .do_update()
            .set(&new_row)
            .execute(conn)?;
    }

    for (group_key, metric) in &diff.deletes {
        diesel::delete(
            pb::peer_benchmarks.filter(pb::group_key.eq(group_key).and(pb::metric.eq(metric))),
        )
        .execute(conn)?;
    }

    Ok(())
}
