//! Peer benchmark seed file: parsing, normalization, and loading.
//!
//! The seed is a TOML document produced by the external aggregation batch:
//!
//! ```toml
//! [groups."apparel:small".metrics.aov]
//! p25 = 45.0
//! p50 = 80.0
//! p75 = 140.0
//! sample = [31.0, 44.0, 78.5, 90.0, 142.0]
//! ```
//!
//! Key behaviors:
//! - Group keys are normalized to lowercase `vertical:bracket` form; a key
//!   without exactly one `:` separator is an error.
//! - Metric keys are lowercased and must be tracked metrics; unknown metrics
//!   can be dropped or treated as an error via [`UnknownMetricPolicy`].
//! - Cut points must satisfy `0 <= p25 <= p50 <= p75`.
//! - Samples are sorted ascending during normalization so stored samples are
//!   always ready for percentile math.

use std::mem;

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::config::{UnknownMetricPolicy, scoring::TRACKED_METRICS};

/// Top-level seed mapping group keys to their metric aggregates.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PeerSeed {
    /// Map of `vertical:bracket` group key -> aggregates.
    pub groups: IndexMap<String, GroupSeed>,
}

/// All aggregate metrics of one peer group.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSeed {
    /// Map of metric name -> aggregate statistics.
    pub metrics: IndexMap<String, MetricSeed>,
}

/// Aggregate statistics of one metric.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricSeed {
    /// 25th percentile cut point.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile cut point.
    pub p75: f64,
    /// Peer observations; sorted ascending during normalization.
    #[serde(default)]
    pub sample: Vec<f64>,
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default)]
pub struct NormalizationReport {
    /// Number of group keys that changed when lowercasing/trimming.
    pub groups_renamed: usize,
    /// Count of metrics dropped because they are not tracked (Drop policy).
    pub metrics_dropped_unknown: usize,
    /// Count of samples that had to be re-sorted.
    pub samples_sorted: usize,
}

/// Normalize a seed in-place with an explicit unknown-metric policy.
pub fn normalize_peer_seed_with_policy(
    seed: &mut PeerSeed,
    policy: UnknownMetricPolicy,
) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let mut rebuilt: IndexMap<String, GroupSeed> = IndexMap::new();
    let old = mem::take(&mut seed.groups);

    for (raw_key, mut group) in old {
        let key = raw_key.trim().to_lowercase();
        let mut parts = key.split(':');
        let (vertical, bracket) = (parts.next().unwrap_or(""), parts.next().unwrap_or(""));
        if vertical.is_empty() || bracket.is_empty() || parts.next().is_some() {
            bail!("group key '{raw_key}' must be '<vertical>:<bracket>'");
        }
        if key != raw_key {
            report.groups_renamed += 1;
        }
        if rebuilt.contains_key(&key) {
            bail!("duplicate group key after normalization: {key}");
        }

        let mut metrics: IndexMap<String, MetricSeed> = IndexMap::new();
        for (raw_metric, mut agg) in mem::take(&mut group.metrics) {
            let metric = raw_metric.trim().to_lowercase();
            if !TRACKED_METRICS.contains(&metric.as_str()) {
                match policy {
                    UnknownMetricPolicy::Drop => {
                        report.metrics_dropped_unknown += 1;
                        continue;
                    }
                    UnknownMetricPolicy::Error => {
                        bail!("group '{key}' has untracked metric '{metric}'");
                    }
                }
            }
            if metrics.contains_key(&metric) {
                bail!("duplicate metric '{metric}' in group '{key}'");
            }

            let cuts = [agg.p25, agg.p50, agg.p75];
            if cuts.iter().any(|c| !c.is_finite() || *c < 0.0) {
                bail!("group '{key}' metric '{metric}' has invalid cut points");
            }
            if !(agg.p25 <= agg.p50 && agg.p50 <= agg.p75) {
                bail!("group '{key}' metric '{metric}' cut points must be ordered p25 <= p50 <= p75");
            }
            if agg.sample.iter().any(|v| !v.is_finite() || *v < 0.0) {
                bail!("group '{key}' metric '{metric}' sample has invalid values");
            }
            if !agg.sample.is_sorted() {
                agg.sample.sort_by(|a, b| a.total_cmp(b));
                report.samples_sorted += 1;
            }

            metrics.insert(metric, agg);
        }
        if metrics.is_empty() {
            bail!("group '{key}' has no usable metrics");
        }
        group.metrics = metrics;
        rebuilt.insert(key, group);
    }

    seed.groups = rebuilt;
    Ok(report)
}

/// Normalize with [`UnknownMetricPolicy::Drop`].
pub fn normalize_peer_seed(seed: &mut PeerSeed) -> anyhow::Result<NormalizationReport> {
    normalize_peer_seed_with_policy(seed, UnknownMetricPolicy::Drop)
}

/// Parse and normalize a seed from a TOML string.
pub fn load_peer_seed_str(toml_str: &str) -> anyhow::Result<PeerSeed> {
    let mut seed: PeerSeed = from_str(toml_str).context("failed to parse peer seed TOML")?;
    let _report = normalize_peer_seed(&mut seed).context("normalize_peer_seed failed")?;
    Ok(seed)
}

/// Read a seed TOML file from disk, parse, and normalize it.
pub fn load_peer_seed_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<PeerSeed> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read peer seed {}", path.as_ref().display()))?;
    load_peer_seed_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk() -> PeerSeed {
        let toml_str = r#"
            [groups."Apparel:Small".metrics.AOV]
            p25 = 45.0
            p50 = 80.0
            p75 = 140.0
            sample = [142.0, 31.0, 78.5]

            [groups."Apparel:Small".metrics.churn]
            p25 = 0.1
            p50 = 0.2
            p75 = 0.3
        "#;
        from_str(toml_str).unwrap()
    }

    #[test]
    fn normalizes_keys_sorts_samples_and_drops_untracked() {
        let mut seed = mk();
        let report = normalize_peer_seed(&mut seed).unwrap();

        assert_eq!(report.groups_renamed, 1);
        assert_eq!(report.metrics_dropped_unknown, 1); // churn is not tracked
        assert_eq!(report.samples_sorted, 1);

        let group = &seed.groups["apparel:small"];
        assert_eq!(group.metrics.len(), 1);
        assert_eq!(group.metrics["aov"].sample, vec![31.0, 78.5, 142.0]);
    }

    #[test]
    fn untracked_metric_as_error() {
        let mut seed = mk();
        let err =
            normalize_peer_seed_with_policy(&mut seed, UnknownMetricPolicy::Error).unwrap_err();
        assert!(err.to_string().contains("untracked metric"));
    }

    #[test]
    fn malformed_group_key_is_rejected() {
        let toml_str = r#"
            [groups."apparel".metrics.aov]
            p25 = 1.0
            p50 = 2.0
            p75 = 3.0
        "#;
        let err = load_peer_seed_str(toml_str).unwrap_err();
        assert!(format!("{err:#}").contains("<vertical>:<bracket>"));
    }

    #[test]
    fn unordered_cut_points_are_rejected() {
        let toml_str = r#"
            [groups."apparel:small".metrics.aov]
            p25 = 90.0
            p50 = 80.0
            p75 = 140.0
        "#;
        let err = load_peer_seed_str(toml_str).unwrap_err();
        assert!(format!("{err:#}").contains("ordered"));
    }
}
