use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::peers::sync::{
    read::Current,
    want::{Wanted, WantedRow},
};

/// What needs to change to make the DB match the seed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerDiff {
    /// Rows to UPSERT, keyed by (group_key, metric).
    pub upserts: BTreeMap<(String, String), WantedRow>,
    /// Rows to DELETE (prune only), keyed by (group_key, metric).
    pub deletes: BTreeSet<(String, String)>,
}

impl PeerDiff {
    /// True if there is nothing to upsert or delete.
    pub fn is_noop(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

impl fmt::Display for PeerDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // helper: section header with underline
        let mut wrote_any = false;
        let mut section = |title: &str,
                           body: &mut dyn FnMut(&mut fmt::Formatter<'_>) -> fmt::Result|
         -> fmt::Result {
            if wrote_any {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            for _ in 0..title.len() {
                write!(f, "-")?;
            }
            writeln!(f)?;
            body(f)?;
            wrote_any = true;
            Ok(())
        };

        if !self.upserts.is_empty() {
            section("Peer Benchmarks (UPSERT)", &mut |f| {
                for ((group, metric), row) in &self.upserts {
                    let n = row.sample_json.matches(',').count()
                        + usize::from(row.sample_json.len() > 2);
                    writeln!(
                        f,
                        "+ {group}/{metric}  p25={} p50={} p75={} (n={n})",
                        row.p25, row.p50, row.p75
                    )?;
                }
                Ok(())
            })?;
        }

        if !self.deletes.is_empty() {
            section("Peer Benchmarks (DELETE)", &mut |f| {
                for (group, metric) in &self.deletes {
                    writeln!(f, "- {group}/{metric}")?;
                }
                Ok(())
            })?;
        }

        if !wrote_any {
            write!(f, "No changes")
        } else {
            Ok(())
        }
    }
}

/// Builds the diff: every wanted row is upserted (idempotent), and with
/// `prune` every stored row absent from the seed is deleted.
pub fn make_diff(w: &Wanted, c: &Current, prune: bool) -> PeerDiff {
    let mut d = PeerDiff {
        upserts: w.rows.clone(),
        ..Default::default()
    };

    if prune {
        for key in c.rows.keys() {
            if !w.rows.contains_key(key) {
                d.deletes.insert(key.clone());
            }
        }
    }

    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wanted_min() -> Wanted {
        let mut rows = BTreeMap::new();
        rows.insert(
            ("apparel:small".to_string(), "aov".to_string()),
            WantedRow {
                p25: 45.0,
                p50: 80.0,
                p75: 140.0,
                sample_json: "[31.0,78.5,142.0]".to_string(),
            },
        );
        Wanted { rows }
    }

    fn current_with_extra() -> Current {
        let mut rows = BTreeMap::new();
        rows.insert(
            ("apparel:small".to_string(), "aov".to_string()),
            WantedRow {
                p25: 40.0,
                p50: 75.0,
                p75: 130.0,
                sample_json: "[]".to_string(),
            },
        );
        rows.insert(
            ("beauty:mid".to_string(), "ltv".to_string()),
            WantedRow {
                p25: 100.0,
                p50: 180.0,
                p75: 260.0,
                sample_json: "[]".to_string(),
            },
        );
        Current { rows }
    }

    #[test]
    fn display_no_changes() {
        let d = make_diff(&Wanted::default(), &Current::default(), false);
        assert!(d.is_noop());
        assert_eq!(d.to_string(), "No changes");
    }

    #[test]
    fn display_upserts_expected() {
        // Upserts only; prune=false so no DELETE section.
        let d = make_diff(&wanted_min(), &Current::default(), false);
        insta::assert_snapshot!(d.to_string().trim_end(), @r###"
        Peer Benchmarks (UPSERT)
        ------------------------
        + apparel:small/aov  p25=45 p50=80 p75=140 (n=3)
        "###);
    }

    #[test]
    fn prune_deletes_rows_missing_from_seed() {
        let d = make_diff(&wanted_min(), &current_with_extra(), true);
        assert_eq!(d.upserts.len(), 1);
        assert_eq!(d.deletes.len(), 1);
        assert!(
            d.deletes
                .contains(&("beauty:mid".to_string(), "ltv".to_string()))
        );

        // Without prune the extra row survives.
        let d = make_diff(&wanted_min(), &current_with_extra(), false);
        assert!(d.deletes.is_empty());
    }
}
