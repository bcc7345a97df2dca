//! Serialized payload types stored in `analysis_results.payload`.
//!
//! Field order is struct order under serde, and every float is rounded to one
//! decimal before serialization, so identical inputs serialize to identical
//! bytes (the caching contract compares payloads verbatim).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scoring::insights::{ImprovementArea, MetricGap, MetricStanding};

/// Benchmark payload: peer-percentile scoring of the tracked metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPayload {
    /// Peer group the merchant was compared against ("apparel:small").
    pub peer_group: String,
    /// Unweighted mean of the per-metric scores, 0..=100.
    pub overall_score: f64,
    /// Per-metric breakdown, in tracked-metric order.
    pub metrics: IndexMap<String, MetricScore>,
    /// Gaps to the peer median for underperforming metrics.
    pub gaps: Vec<MetricGap>,
    /// Configured tactics for underperforming metrics.
    pub improvement_areas: Vec<ImprovementArea>,
}

/// One metric's comparison against the peer distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    /// The merchant's value.
    pub value: f64,
    /// Fraction of the peer distribution at or below the value, 0..=100.
    pub percentile: f64,
    /// Monotonic 0..=100 score (the percentile).
    pub score: f64,
    /// Peer 25th percentile cut point.
    pub p25: f64,
    /// Peer median.
    pub p50: f64,
    /// Peer 75th percentile cut point.
    pub p75: f64,
    /// Standing relative to the configured thresholds.
    pub standing: MetricStanding,
}

/// Discovery payload: persona and maturity classification with narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryPayload {
    /// Persona label from the fixed enumerated set.
    pub persona: String,
    /// Persona confidence in `[0, 1]`.
    pub persona_confidence: f64,
    /// Maturity stage label.
    pub maturity_stage: String,
    /// Maturity confidence in `[0, 1]`.
    pub maturity_confidence: f64,
    /// The metric values the classification was derived from.
    pub key_metrics: IndexMap<String, f64>,
    /// Observable characteristics of the winning persona.
    pub characteristics: Vec<String>,
    /// Strengths: persona strengths plus metrics at or above the strength
    /// threshold.
    pub strengths: Vec<String>,
    /// Opportunities: persona opportunities plus metrics at or below the
    /// warning threshold.
    pub opportunities: Vec<String>,
    /// What to do to reach the next maturity stage.
    pub next_stage_requirements: Vec<String>,
}
