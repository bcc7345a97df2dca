//! Template-driven strategy generation and ranking.
//!
//! The generator instantiates the configured templates for one merchant,
//! ranks them by a deterministic priority score, and inserts up to `limit`
//! of them. Regeneration is non-destructive: a template whose type is
//! already in flight (recommended or active) for the merchant is skipped,
//! never overwritten.

use diesel::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::templates::{StrategyTemplate, TemplateCatalog},
    error::{EngineError, EngineResult},
    kind::AnalysisKind,
    models::{
        merchant::MetricSnapshot,
        strategy::{NewStrategy, StrategyRow, StrategyStatus},
    },
    scoring::payload::{BenchmarkPayload, DiscoveryPayload},
    store::{MerchantStore, ResultStore, StrategyStore},
};

/// Multiplier applied when the merchant trails its peer group overall.
const UNDERPERFORMER_BOOST: f64 = 1.2;
/// Multiplier applied when the template matches the merchant's persona.
const PERSONA_BOOST: f64 = 1.15;
/// Multiplier applied when the merchant misses an eligibility gate.
const INELIGIBLE_PENALTY: f64 = 0.3;
/// ROI value that maps to a base score of 100.
const ROI_CEILING: f64 = 300.0;

/// Deterministic ranking score for one template in one merchant's context.
///
/// base = 100 * min(expected_roi / 300, 1), then:
/// x1.2 when the latest benchmark overall score is below 50,
/// x1.15 when the merchant's persona is in the template's affinity list,
/// x0.3 when an eligibility gate is missed; capped at 100, rounded to 2dp.
pub fn priority_score(
    expected_roi: f64,
    eligible: bool,
    benchmark_overall: Option<f64>,
    persona_match: bool,
) -> f64 {
    let mut score = 100.0 * (expected_roi / ROI_CEILING).min(1.0);
    if benchmark_overall.is_some_and(|overall| overall < 50.0) {
        score *= UNDERPERFORMER_BOOST;
    }
    if persona_match {
        score *= PERSONA_BOOST;
    }
    if !eligible {
        score *= INELIGIBLE_PENALTY;
    }
    (score.min(100.0) * 100.0).round() / 100.0
}

/// Revenue estimate carried on each strategy row: a tenth of monthly revenue
/// scaled by the template ROI against a 150% baseline.
fn estimate_revenue(monthly_revenue: f64, expected_roi: f64) -> f64 {
    let base = monthly_revenue * 0.1;
    let multiplier = expected_roi / 150.0;
    ((base * multiplier) * 100.0).round() / 100.0
}

/// Persona labels are stored in payloads; affinity lists use config codes.
fn label_to_code(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

fn new_strategy_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("STRAT_{}", hex[..8].to_uppercase())
}

struct Candidate<'a> {
    type_code: &'a str,
    template: &'a StrategyTemplate,
    priority: f64,
    eligible: bool,
    estimated_revenue: f64,
}

/// Generates up to `limit` ranked strategies for the merchant.
///
/// Errors: unknown merchant -> `NotFound`; metrics never synced ->
/// `Validation` (the generator never fabricates strategies from empty
/// input).
pub fn generate<S>(
    conn: &mut SqliteConnection,
    store: &S,
    catalog: &TemplateCatalog,
    merchant_code: &str,
    limit: usize,
) -> EngineResult<Vec<StrategyRow>>
where
    S: MerchantStore + ResultStore + StrategyStore,
{
    let merchant = store.merchant_by_code(conn, merchant_code)?;
    let metrics = MetricSnapshot::from_row(&merchant)?;

    conn.immediate_transaction::<_, EngineError, _>(|conn| {
        // Latest analyses are optional context, not prerequisites.
        let discovery: Option<DiscoveryPayload> = store
            .latest_result(conn, merchant.id, AnalysisKind::Discovery)?
            .and_then(|row| serde_json::from_str(&row.payload).ok());
        let benchmark_overall: Option<f64> = store
            .latest_result(conn, merchant.id, AnalysisKind::Benchmark)?
            .and_then(|row| serde_json::from_str::<BenchmarkPayload>(&row.payload).ok())
            .map(|p| p.overall_score);

        let persona_code = discovery
            .as_ref()
            .map(|d| label_to_code(&d.persona));
        let maturity_stage = discovery.as_ref().map(|d| d.maturity_stage.clone());

        let in_flight = store.in_flight_types(conn, merchant.id)?;

        let mut candidates: Vec<Candidate<'_>> = catalog
            .templates
            .iter()
            .filter(|(type_code, _)| !in_flight.contains(*type_code))
            .map(|(type_code, template)| {
                let eligible = template
                    .eligibility
                    .check(&metrics, maturity_stage.as_deref());
                let persona_match = persona_code
                    .as_deref()
                    .is_some_and(|code| template.persona_affinity.iter().any(|a| a == code));
                Candidate {
                    type_code,
                    template,
                    priority: priority_score(
                        template.expected_roi,
                        eligible,
                        benchmark_overall,
                        persona_match,
                    ),
                    eligible,
                    estimated_revenue: estimate_revenue(
                        metrics.monthly_revenue,
                        template.expected_roi,
                    ),
                }
            })
            .collect();

        // Stable sort keeps catalog order on ties, so ranking is
        // deterministic end to end.
        candidates.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        candidates.truncate(limit);

        let mut inserted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let code = new_strategy_code();
            let steps_json = serde_json::to_string(&candidate.template.action_steps)?;
            let row = NewStrategy {
                strategy_code: &code,
                merchant_id: merchant.id,
                name: &candidate.template.name,
                strategy_type: candidate.type_code,
                description: &candidate.template.description,
                priority_score: candidate.priority,
                expected_roi: candidate.template.expected_roi,
                estimated_revenue: candidate.estimated_revenue,
                confidence: if candidate.eligible { 0.75 } else { 0.45 },
                action_steps: &steps_json,
                effort: candidate.template.effort.as_str(),
                timeline: &candidate.template.timeline,
                eligible: candidate.eligible,
                status: StrategyStatus::Recommended.as_str(),
            };
            inserted.push(store.insert_strategy(conn, &row)?);
        }

        info!(
            merchant = %merchant.merchant_code,
            generated = inserted.len(),
            skipped_in_flight = in_flight.len(),
            "strategy generation finished"
        );

        Ok(inserted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_formula_documented_defaults() {
        // base only: 250 ROI -> 83.33
        assert_eq!(priority_score(250.0, true, None, false), 83.33);
        // underperformer boost: 83.33 * 1.2 = 100 (capped)
        assert_eq!(priority_score(250.0, true, Some(40.0), false), 100.0);
        // persona boost on a mid template: 180/300*100 * 1.15 = 69
        assert_eq!(priority_score(180.0, true, None, true), 69.0);
        // ineligibility crushes the score: 60 * 0.3 = 18
        assert_eq!(priority_score(180.0, false, None, false), 18.0);
        // boosts compose before the cap
        assert_eq!(priority_score(300.0, true, Some(10.0), true), 100.0);
    }

    #[test]
    fn priority_is_monotone_in_roi() {
        let low = priority_score(90.0, true, None, false);
        let high = priority_score(200.0, true, None, false);
        assert!(low < high);
    }

    #[test]
    fn revenue_estimate_scales_with_roi() {
        assert_eq!(estimate_revenue(25_000.0, 150.0), 2_500.0);
        assert_eq!(estimate_revenue(25_000.0, 300.0), 5_000.0);
        assert_eq!(estimate_revenue(0.0, 300.0), 0.0);
    }

    #[test]
    fn persona_labels_map_to_config_codes() {
        assert_eq!(label_to_code("Brand Builder"), "brand_builder");
        assert_eq!(label_to_code(" Discount Discounter "), "discount_discounter");
    }

    #[test]
    fn strategy_codes_have_the_expected_shape() {
        let code = new_strategy_code();
        assert!(code.starts_with("STRAT_"));
        assert_eq!(code.len(), 14);
        assert!(code[6..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
