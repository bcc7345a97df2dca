//! Threshold-driven narrative insights over per-metric percentiles.

use serde::{Deserialize, Serialize};

use crate::config::scoring::ScoringConfig;

/// Where a metric stands relative to the configured percentile thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStanding {
    /// Percentile at or above the strength threshold.
    Strength,
    /// Between the two thresholds.
    Average,
    /// Percentile at or below the warning threshold.
    Warning,
}

/// Classifies a percentile against the configured thresholds.
pub fn standing(percentile: f64, cfg: &ScoringConfig) -> MetricStanding {
    if percentile >= cfg.thresholds.strength_percentile {
        MetricStanding::Strength
    } else if percentile <= cfg.thresholds.warning_percentile {
        MetricStanding::Warning
    } else {
        MetricStanding::Average
    }
}

/// Distance from the peer median for one underperforming metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricGap {
    /// Canonical metric name.
    pub metric: String,
    /// How far the merchant sits below the peer median (`p50 - value`).
    pub gap_to_median: f64,
}

/// Suggested tactics for one underperforming metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementArea {
    /// Canonical metric name.
    pub metric: String,
    /// Configured tactics, in configured order.
    pub tactics: Vec<String>,
}

/// Gap entry for a metric scoring below the midpoint, if it underperforms.
pub fn gap_for_metric(metric: &str, value: f64, p50: f64, score: f64) -> Option<MetricGap> {
    if score < 50.0 && p50 > value {
        Some(MetricGap {
            metric: metric.to_string(),
            gap_to_median: round1(p50 - value),
        })
    } else {
        None
    }
}

/// Improvement entry for a metric scoring below the midpoint, when the config
/// has tactics for it.
pub fn improvement_for_metric(
    metric: &str,
    score: f64,
    cfg: &ScoringConfig,
) -> Option<ImprovementArea> {
    if score >= 50.0 {
        return None;
    }
    cfg.improvement_tactics
        .get(metric)
        .map(|tactics| ImprovementArea {
            metric: metric.to_string(),
            tactics: tactics.clone(),
        })
}

/// Round to one decimal, the payload-wide precision.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standing_uses_configured_thresholds() {
        let cfg = ScoringConfig::default();
        assert_eq!(standing(80.0, &cfg), MetricStanding::Strength);
        assert_eq!(standing(75.0, &cfg), MetricStanding::Strength);
        assert_eq!(standing(50.0, &cfg), MetricStanding::Average);
        assert_eq!(standing(25.0, &cfg), MetricStanding::Warning);
        assert_eq!(standing(3.0, &cfg), MetricStanding::Warning);
    }

    #[test]
    fn gaps_only_report_genuine_underperformance() {
        // Below the midpoint and below the median: a gap.
        let gap = gap_for_metric("aov", 30.0, 80.0, 20.0).unwrap();
        assert_eq!(gap.gap_to_median, 50.0);

        // Scoring fine: no gap even if below median.
        assert!(gap_for_metric("aov", 79.0, 80.0, 55.0).is_none());
        // Above median: no gap regardless of score.
        assert!(gap_for_metric("aov", 90.0, 80.0, 40.0).is_none());
    }

    #[test]
    fn improvements_come_from_config() {
        let cfg = ScoringConfig::default();
        let area = improvement_for_metric("ltv", 35.0, &cfg).unwrap();
        assert!(area.tactics.contains(&"Loyalty".to_string()));
        assert!(improvement_for_metric("ltv", 65.0, &cfg).is_none());
        assert!(improvement_for_metric("unknown_metric", 10.0, &cfg).is_none());
    }
}
