//! Peer benchmark synchronization (seed file -> `peer_benchmarks` table).
//!
//! ## What this does
//! - Parses a [`PeerSeed`](crate::peers::seed::PeerSeed) (TOML) and
//!   **normalizes** it (lowercase keys, ordered cut points, sorted samples).
//! - Computes a **diff** between the seed (desired) and the DB (current).
//! - Applies the diff with UPSERTs (idempotent) and optional **prune**
//!   deletes for groups that left the seed.
//!
//! ## Transactions & consistency
//! Everything runs inside a single **`BEGIN IMMEDIATE`** transaction via
//! `SqliteConnection::immediate_transaction`. This reduces `SQLITE_BUSY`
//! surprises and ensures we either apply the whole diff or none of it.
//!
//! ## Dry-run
//! When `SyncOptions::dry_run` is `true`, the structured [`PeerDiff`] is
//! returned and nothing is written. Callers can pretty-print the diff.

mod apply;
mod diff;
mod read;
mod want;

pub use diff::PeerDiff;
pub use want::WantedRow;

use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::peers::seed::{PeerSeed, normalize_peer_seed};

/// Options for peer benchmark synchronization.
pub struct SyncOptions {
    /// If true, compute the diff only; do not write.
    pub dry_run: bool,
    /// If true, delete rows whose (group, metric) is absent from the seed.
    pub prune: bool,
}

/// Sync the peer benchmark seed into SQLite and return the applied diff.
///
/// - Normalizes the seed, then UPSERTs every (group, metric) row it names.
/// - When `opt.prune` is true, removes rows not present in the seed.
/// - Runs in a single immediate transaction.
pub fn sync_peer_benchmarks(
    conn: &mut SqliteConnection,
    mut seed: PeerSeed,
    opt: &SyncOptions,
) -> anyhow::Result<PeerDiff> {
    let _ = normalize_peer_seed(&mut seed)?;

    let wanted = want::build_wanted(&seed);

    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let current = read::read_current(conn)?;
        let diff = diff::make_diff(&wanted, &current, opt.prune);

        if !opt.dry_run {
            apply::apply_diff(conn, &diff)?;
        }

        Ok(diff)
    })
}
