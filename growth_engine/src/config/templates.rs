//! Strategy template catalog: parsing, normalization, and defaults.
//!
//! A template describes one marketing play (welcome series, abandoned cart,
//! …) with its expected ROI, effort, action steps, eligibility gates, and the
//! personas it resonates with. The generator instantiates templates into
//! concrete strategy rows; templates themselves are configuration.

use std::{collections::HashSet, mem};

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::models::merchant::MetricSnapshot;

/// Top-level catalog mapping template type codes to their definition.
///
/// Keys are normalized to lowercase during normalization
/// (e.g., "Welcome_Series" -> "welcome_series") and become the
/// `strategies.strategy_type` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateCatalog {
    /// Map of template type code -> definition.
    pub templates: IndexMap<String, StrategyTemplate>,
}

/// One marketing play the generator can recommend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyTemplate {
    /// Display name ("Welcome Series").
    pub name: String,
    /// What the play does, shown to the merchant.
    pub description: String,
    /// Expected return on investment, percent.
    pub expected_roi: f64,
    /// Implementation effort level.
    pub effort: EffortLevel,
    /// Expected implementation timeline ("1-2 weeks").
    pub timeline: String,
    /// Ordered implementation steps.
    pub action_steps: Vec<String>,
    /// Metric gates a merchant must pass to be fully eligible.
    #[serde(default)]
    pub eligibility: EligibilityRules,
    /// Persona codes (normalized lowercase) this play is boosted for.
    #[serde(default)]
    pub persona_affinity: Vec<String>,
}

/// Implementation effort levels (serde snake_case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    /// A few days of work.
    Low,
    /// One to two weeks of work.
    Medium,
    /// Multiple weeks and dedicated resources.
    High,
}

impl EffortLevel {
    /// Stable storage code for the `strategies.effort` column.
    pub fn as_str(self) -> &'static str {
        match self {
            EffortLevel::Low => "low",
            EffortLevel::Medium => "medium",
            EffortLevel::High => "high",
        }
    }
}

/// Metric gates a merchant must pass for a template to be fully eligible.
///
/// An ineligible merchant can still see the strategy, but its priority is
/// penalized and its confidence lowered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EligibilityRules {
    /// Minimum email subscriber count.
    pub min_subscribers: Option<i64>,
    /// Minimum average order value.
    pub min_aov: Option<f64>,
    /// Minimum lifetime customer count.
    pub min_customers: Option<i64>,
    /// Minimum lifetime order count.
    pub min_orders: Option<i64>,
    /// Minimum customer lifetime value.
    pub min_ltv: Option<f64>,
    /// Maturity stage labels (lowercase) the play is appropriate for.
    pub allowed_maturity: Option<Vec<String>>,
}

impl EligibilityRules {
    /// Whether the merchant passes every configured gate.
    ///
    /// `maturity_stage` is the label from the latest discovery analysis, when
    /// one exists; a missing analysis only fails the maturity gate if the
    /// template has one.
    pub fn check(&self, metrics: &MetricSnapshot, maturity_stage: Option<&str>) -> bool {
        if let Some(min) = self.min_subscribers {
            if (metrics.email_subscriber_count as i64) < min {
                return false;
            }
        }
        if let Some(min) = self.min_aov {
            if metrics.aov < min {
                return false;
            }
        }
        if let Some(min) = self.min_customers {
            if (metrics.total_customers as i64) < min {
                return false;
            }
        }
        if let Some(min) = self.min_orders {
            if (metrics.total_orders as i64) < min {
                return false;
            }
        }
        if let Some(min) = self.min_ltv {
            if metrics.ltv < min {
                return false;
            }
        }
        if let Some(allowed) = &self.allowed_maturity {
            match maturity_stage {
                Some(stage) => {
                    let stage = stage.to_lowercase();
                    if !allowed.iter().any(|a| *a == stage) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

/// Summary of changes performed during catalog normalization.
#[derive(Debug, Default)]
pub struct NormalizationReport {
    /// Number of template keys that changed when lowercasing/trimming.
    pub templates_renamed: usize,
    /// Count of removed duplicate action steps.
    pub steps_deduped: usize,
    /// Count of removed duplicate persona affinities.
    pub affinities_deduped: usize,
}

/// Normalize a template catalog in-place.
///
/// - Lowercase + trim template keys; reject duplicates after normalization
/// - Trim name/description/timeline; reject empties
/// - Reject non-finite or out-of-range expected ROI (0..=1000)
/// - Trim + dedupe action steps preserving order
/// - Lowercase + dedupe persona affinities and allowed maturity stages
/// - Reject negative eligibility gates
pub fn normalize_template_catalog(
    cat: &mut TemplateCatalog,
) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let mut rebuilt: IndexMap<String, StrategyTemplate> = IndexMap::new();
    let old = mem::take(&mut cat.templates);

    for (raw_code, mut tpl) in old {
        let code = raw_code.trim().to_lowercase();
        if code.is_empty() {
            bail!("template code cannot be empty after trimming");
        }
        if code != raw_code {
            report.templates_renamed += 1;
        }
        if rebuilt.contains_key(&code) {
            bail!("duplicate template code after normalization: {code}");
        }

        tpl.name = tpl.name.trim().to_string();
        tpl.description = tpl.description.trim().to_string();
        tpl.timeline = tpl.timeline.trim().to_string();
        if tpl.name.is_empty() || tpl.description.is_empty() || tpl.timeline.is_empty() {
            bail!("template '{code}' has an empty name, description, or timeline");
        }
        if !tpl.expected_roi.is_finite() || !(0.0..=1000.0).contains(&tpl.expected_roi) {
            bail!("template '{code}' expected_roi must be within 0..=1000");
        }

        let before_len = tpl.action_steps.len();
        let mut seen = HashSet::new();
        let mut steps = Vec::with_capacity(before_len);
        for step in mem::take(&mut tpl.action_steps) {
            let step = step.trim().to_string();
            if step.is_empty() {
                bail!("template '{code}' has an empty action step");
            }
            if seen.insert(step.clone()) {
                steps.push(step);
            }
        }
        if steps.is_empty() {
            bail!("template '{code}' needs at least one action step");
        }
        report.steps_deduped += before_len.saturating_sub(steps.len());
        tpl.action_steps = steps;

        let before_len = tpl.persona_affinity.len();
        let mut seen = HashSet::new();
        let mut affinities = Vec::with_capacity(before_len);
        for persona in mem::take(&mut tpl.persona_affinity) {
            let persona = persona.trim().to_lowercase();
            if persona.is_empty() {
                bail!("template '{code}' has an empty persona affinity");
            }
            if seen.insert(persona.clone()) {
                affinities.push(persona);
            }
        }
        report.affinities_deduped += before_len.saturating_sub(affinities.len());
        tpl.persona_affinity = affinities;

        if let Some(allowed) = &mut tpl.eligibility.allowed_maturity {
            for stage in allowed.iter_mut() {
                *stage = stage.trim().to_lowercase();
                if stage.is_empty() {
                    bail!("template '{code}' has an empty allowed maturity stage");
                }
            }
        }
        let e = &tpl.eligibility;
        let negative_gate = e.min_subscribers.is_some_and(|v| v < 0)
            || e.min_customers.is_some_and(|v| v < 0)
            || e.min_orders.is_some_and(|v| v < 0)
            || e.min_aov.is_some_and(|v| v < 0.0)
            || e.min_ltv.is_some_and(|v| v < 0.0);
        if negative_gate {
            bail!("template '{code}' has a negative eligibility gate");
        }

        rebuilt.insert(code, tpl);
    }

    if rebuilt.is_empty() {
        bail!("template catalog cannot be empty");
    }
    cat.templates = rebuilt;
    Ok(report)
}

/// Parse and normalize a template catalog from a TOML string.
pub fn load_template_catalog_str(toml_str: &str) -> anyhow::Result<TemplateCatalog> {
    let mut cat: TemplateCatalog =
        from_str(toml_str).context("failed to parse template catalog TOML")?;
    let _report =
        normalize_template_catalog(&mut cat).context("normalize_template_catalog failed")?;
    Ok(cat)
}

/// Read a template catalog TOML file from disk, parse, and normalize it.
pub fn load_template_catalog_path(
    path: impl AsRef<std::path::Path>,
) -> anyhow::Result<TemplateCatalog> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read template catalog {}", path.as_ref().display()))?;
    load_template_catalog_str(&text)
}

fn template(
    name: &str,
    description: &str,
    expected_roi: f64,
    effort: EffortLevel,
    timeline: &str,
    action_steps: &[&str],
    eligibility: EligibilityRules,
    persona_affinity: &[&str],
) -> StrategyTemplate {
    StrategyTemplate {
        name: name.into(),
        description: description.into(),
        expected_roi,
        effort,
        timeline: timeline.into(),
        action_steps: action_steps.iter().map(|s| s.to_string()).collect(),
        eligibility,
        persona_affinity: persona_affinity.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for TemplateCatalog {
    /// The documented default catalog of eight plays.
    fn default() -> Self {
        let templates = IndexMap::from([
            (
                "welcome_series".to_string(),
                template(
                    "Welcome Series",
                    "Automated email sequence for new subscribers",
                    180.0,
                    EffortLevel::Medium,
                    "1-2 weeks",
                    &[
                        "Create 3-email welcome sequence",
                        "Set up automation triggers",
                        "Design templates",
                        "Add exclusive discount",
                    ],
                    EligibilityRules {
                        min_subscribers: Some(100),
                        ..Default::default()
                    },
                    &["lifecycle_master"],
                ),
            ),
            (
                "abandoned_cart".to_string(),
                template(
                    "Abandoned Cart",
                    "Recover sales from abandoned shopping carts",
                    250.0,
                    EffortLevel::Medium,
                    "1-2 weeks",
                    &[
                        "Set up cart tracking",
                        "Create 2-3 reminder emails",
                        "Add urgency elements",
                        "Include recovery incentive",
                    ],
                    EligibilityRules {
                        min_orders: Some(50),
                        ..Default::default()
                    },
                    &["segment_specialist"],
                ),
            ),
            (
                "win_back".to_string(),
                template(
                    "Win-Back",
                    "Reactivate customers who have stopped purchasing",
                    120.0,
                    EffortLevel::Low,
                    "3-5 days",
                    &[
                        "Identify inactive customers",
                        "Create win-back offer",
                        "Design email series",
                        "Track reactivation",
                    ],
                    EligibilityRules {
                        min_customers: Some(200),
                        ..Default::default()
                    },
                    &[],
                ),
            ),
            (
                "post_purchase".to_string(),
                template(
                    "Post-Purchase",
                    "Follow-up flow that turns first orders into repeat orders",
                    150.0,
                    EffortLevel::Medium,
                    "1-2 weeks",
                    &[
                        "Set up automation",
                        "Request feedback",
                        "Recommend products",
                        "Offer loyalty points",
                    ],
                    EligibilityRules {
                        min_orders: Some(100),
                        ..Default::default()
                    },
                    &["brand_builder"],
                ),
            ),
            (
                "vip_segment".to_string(),
                template(
                    "VIP Segment",
                    "Exclusive program for the highest-value customers",
                    200.0,
                    EffortLevel::High,
                    "2-3 weeks",
                    &[
                        "Define VIP criteria",
                        "Create exclusive benefits",
                        "Design premium campaigns",
                        "Implement rewards",
                    ],
                    EligibilityRules {
                        min_customers: Some(500),
                        min_ltv: Some(150.0),
                        allowed_maturity: Some(vec![
                            "growth".into(),
                            "scale-up".into(),
                            "mature".into(),
                        ]),
                        ..Default::default()
                    },
                    &["discount_discounter", "brand_builder", "segment_specialist"],
                ),
            ),
            (
                "new_product_launch".to_string(),
                template(
                    "New Product Launch",
                    "Build anticipation and drive first-week sales for a launch",
                    160.0,
                    EffortLevel::Medium,
                    "1-2 weeks",
                    &[
                        "Build anticipation",
                        "Create launch sequence",
                        "Segment audience",
                        "Offer early-bird discount",
                    ],
                    EligibilityRules {
                        min_customers: Some(100),
                        ..Default::default()
                    },
                    &["product_pusher"],
                ),
            ),
            (
                "seasonal_promotion".to_string(),
                template(
                    "Seasonal Promotion",
                    "Themed campaign tied to a seasonal buying moment",
                    90.0,
                    EffortLevel::Low,
                    "3-5 days",
                    &[
                        "Plan campaign calendar",
                        "Create themed templates",
                        "Segment by history",
                        "Design offers",
                    ],
                    EligibilityRules::default(),
                    &["discount_discounter"],
                ),
            ),
            (
                "re_engagement".to_string(),
                template(
                    "Re-engagement",
                    "Wake up unengaged subscribers before list hygiene removes them",
                    110.0,
                    EffortLevel::Low,
                    "2-4 days",
                    &[
                        "Identify unengaged subscribers",
                        "Create re-engagement email",
                        "Offer return incentive",
                        "Clean list",
                    ],
                    EligibilityRules {
                        min_subscribers: Some(1_000),
                        ..Default::default()
                    },
                    &["lifecycle_master"],
                ),
            ),
        ]);

        TemplateCatalog { templates }
    }
}
