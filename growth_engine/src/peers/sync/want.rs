//! Desired state, flattened from a normalized seed.

use std::collections::BTreeMap;

use crate::peers::seed::PeerSeed;

/// One desired benchmark row, sample already serialized for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct WantedRow {
    /// 25th percentile cut point.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile cut point.
    pub p75: f64,
    /// Sorted sample as the JSON string the table stores.
    pub sample_json: String,
}

/// Desired rows keyed by (group_key, metric).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Wanted {
    /// Every row the seed wants present.
    pub rows: BTreeMap<(String, String), WantedRow>,
}

/// Flattens a normalized seed into storable rows.
pub fn build_wanted(seed: &PeerSeed) -> Wanted {
    let mut rows = BTreeMap::new();
    for (group_key, group) in &seed.groups {
        for (metric, agg) in &group.metrics {
            // Normalized samples are sorted and finite, so this cannot fail.
            let sample_json =
                serde_json::to_string(&agg.sample).unwrap_or_else(|_| "[]".to_string());
            rows.insert(
                (group_key.clone(), metric.clone()),
                WantedRow {
                    p25: agg.p25,
                    p50: agg.p50,
                    p75: agg.p75,
                    sample_json,
                },
            );
        }
    }
    Wanted { rows }
}
