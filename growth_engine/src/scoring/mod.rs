//! The pure scoring engine: metrics + peer aggregates in, payloads out.
//!
//! No I/O happens here. Both entry points are deterministic: for fixed
//! inputs they produce identical payloads, which is what makes the
//! orchestrator's caching contract meaningful.

pub mod classify;
pub mod insights;
pub mod payload;
pub mod percentile;

use indexmap::IndexMap;

use crate::{
    config::scoring::ScoringConfig,
    error::{EngineError, EngineResult},
    models::merchant::MetricSnapshot,
    peers::PeerAggregates,
    scoring::{
        insights::{gap_for_metric, improvement_for_metric, round1, standing},
        payload::{BenchmarkPayload, DiscoveryPayload, MetricScore},
        percentile::metric_score,
    },
};

fn require_aggregate<'a>(
    aggregates: &'a PeerAggregates,
    metric: &'static str,
) -> EngineResult<&'a crate::peers::MetricAggregate> {
    aggregates
        .get(metric)
        .ok_or(EngineError::DependencyUnavailable {
            dependency: "peer aggregates",
            reason: format!("peer group is missing metric '{metric}'"),
        })
}

/// Scores the tracked metrics against the peer group.
///
/// Fails with `DependencyUnavailable` if any tracked metric is missing from
/// the aggregates — a partial score would be indistinguishable from a
/// genuinely poor one.
pub fn score_benchmark(
    metrics: &MetricSnapshot,
    peer_group: &str,
    aggregates: &PeerAggregates,
    cfg: &ScoringConfig,
) -> EngineResult<BenchmarkPayload> {
    let mut per_metric: IndexMap<String, MetricScore> = IndexMap::new();
    let mut gaps = Vec::new();
    let mut improvement_areas = Vec::new();
    let mut score_sum = 0.0;

    for (name, value) in metrics.tracked_metrics() {
        let agg = require_aggregate(aggregates, name)?;
        let (percentile, score) = metric_score(value, agg);
        score_sum += score;

        if let Some(gap) = gap_for_metric(name, value, agg.p50, score) {
            gaps.push(gap);
        }
        if let Some(area) = improvement_for_metric(name, score, cfg) {
            improvement_areas.push(area);
        }

        per_metric.insert(
            name.to_string(),
            MetricScore {
                value: round1(value),
                percentile: round1(percentile),
                score: round1(score),
                p25: round1(agg.p25),
                p50: round1(agg.p50),
                p75: round1(agg.p75),
                standing: standing(percentile, cfg),
            },
        );
    }

    let overall = score_sum / metrics.tracked_metrics().len() as f64;

    Ok(BenchmarkPayload {
        peer_group: peer_group.to_string(),
        overall_score: round1(overall.clamp(0.0, 100.0)),
        metrics: per_metric,
        gaps,
        improvement_areas,
    })
}

/// Classifies the merchant and derives the discovery narrative.
///
/// Uses the same aggregate requirement as the benchmark path: percentile
/// standings feed the strengths/opportunities lists, and a missing peer
/// group must surface instead of silently weakening the output.
pub fn score_discovery(
    metrics: &MetricSnapshot,
    aggregates: &PeerAggregates,
    cfg: &ScoringConfig,
) -> EngineResult<DiscoveryPayload> {
    let persona = classify::classify_persona(metrics, cfg);
    let maturity = classify::classify_maturity(metrics, cfg);

    let rule = cfg
        .personas
        .values()
        .find(|r| r.label == persona.label)
        .expect("classification returned a configured label");

    let mut strengths = rule.strengths.clone();
    let mut opportunities = rule.opportunities.clone();
    for (name, value) in metrics.tracked_metrics() {
        let agg = require_aggregate(aggregates, name)?;
        let (percentile, _) = metric_score(value, agg);
        match standing(percentile, cfg) {
            insights::MetricStanding::Strength => {
                strengths.push(format!("{name} sits in the top quartile of the peer group"));
            }
            insights::MetricStanding::Warning => {
                opportunities.push(format!(
                    "{name} trails the bottom quartile of the peer group"
                ));
            }
            insights::MetricStanding::Average => {}
        }
    }

    let key_metrics: IndexMap<String, f64> = metrics
        .tracked_metrics()
        .into_iter()
        .map(|(name, value)| (name.to_string(), round1(value)))
        .chain([
            ("monthly_revenue".to_string(), round1(metrics.monthly_revenue)),
            ("total_customers".to_string(), f64::from(metrics.total_customers)),
            ("discount_frequency".to_string(), round1(metrics.discount_frequency)),
        ])
        .collect();

    Ok(DiscoveryPayload {
        persona: persona.label,
        persona_confidence: (persona.confidence * 100.0).round() / 100.0,
        maturity_stage: maturity.label.clone(),
        maturity_confidence: maturity.confidence,
        key_metrics,
        characteristics: rule.characteristics.clone(),
        strengths,
        opportunities,
        next_stage_requirements: classify::next_stage_requirements(&maturity.label, cfg).to_vec(),
    })
}
