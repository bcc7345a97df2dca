//! Scoring configuration: parsing, normalization, and defaults.
//!
//! This module defines a TOML-backed scoring profile that describes:
//! - Insight thresholds (strength/warning percentile cut points)
//! - Size brackets used to derive a merchant's peer-group key
//! - Maturity stages (revenue/customer boundaries and next-stage guidance)
//! - Persona rules (weighted metric signals plus narrative text)
//! - Per-metric improvement tactics
//!
//! Key behaviors:
//! - Normalization enforces lowercase persona/bracket/metric codes, trims
//!   whitespace, and de-duplicates entries while preserving order.
//! - Signals and tactics referencing unknown metrics can be dropped or
//!   treated as an error via [`UnknownMetricPolicy`].
//! - [`ScoringConfig::default`] is the documented default profile; every
//!   numeric constant the scoring engine uses lives here, not in call sites.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_scoring_config_str`]
//! - Parse + normalize from a file path: [`load_scoring_config_path`]
//! - Normalization with explicit policy: [`normalize_scoring_config_with_policy`]

use std::{collections::HashSet, mem};

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::config::UnknownMetricPolicy;

/// Every metric name the engine understands.
pub const KNOWN_METRICS: &[&str] = &[
    "monthly_revenue",
    "total_customers",
    "total_orders",
    "aov",
    "repeat_purchase_rate",
    "ltv",
    "customer_acquisition_cost",
    "email_subscriber_count",
    "discount_frequency",
    "campaign_engagement",
];

/// The metrics scored against peer aggregates, in presentation order.
pub const TRACKED_METRICS: &[&str] = &[
    "aov",
    "ltv",
    "repeat_purchase_rate",
    "campaign_engagement",
];

/// Top-level scoring profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Version tag stamped into every computed analysis result.
    pub version: String,
    /// Percentile cut points for insight generation.
    pub thresholds: InsightThresholds,
    /// Ordered revenue brackets used to derive the peer-group key.
    pub size_brackets: Vec<SizeBracket>,
    /// Ordered maturity stages, ascending by revenue boundary.
    pub maturity_stages: Vec<MaturityStage>,
    /// Persona rules keyed by normalized persona code.
    pub personas: IndexMap<String, PersonaRule>,
    /// Improvement tactics keyed by metric name, used for low-scoring metrics.
    pub improvement_tactics: IndexMap<String, Vec<String>>,
}

/// Percentile thresholds that turn scores into narrative insights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsightThresholds {
    /// A metric at or above this percentile is reported as a strength.
    pub strength_percentile: f64,
    /// A metric at or below this percentile is reported as a warning.
    pub warning_percentile: f64,
}

/// One revenue bracket of the peer-group segmentation key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeBracket {
    /// Bracket code, normalized lowercase (e.g., "small").
    pub name: String,
    /// Exclusive upper bound on monthly revenue; `None` means open-ended and
    /// must be the last bracket.
    pub max_monthly_revenue: Option<f64>,
}

/// One maturity stage with its entry boundaries and guidance text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaturityStage {
    /// Stage label (e.g., "Scale-Up").
    pub name: String,
    /// Minimum monthly revenue to qualify for this stage.
    pub min_monthly_revenue: f64,
    /// Minimum customer count to qualify for this stage.
    pub min_customers: i64,
    /// What a merchant in this stage should do to reach the next one.
    pub next_stage_requirements: Vec<String>,
}

/// A persona with its weighted metric signals and narrative text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaRule {
    /// Display label (e.g., "Brand Builder").
    pub label: String,
    /// One-line description of the persona.
    pub description: String,
    /// Weighted indicator conditions; the persona with the highest matched
    /// weight fraction wins.
    pub signals: Vec<PersonaSignal>,
    /// Observable characteristics of merchants with this persona.
    pub characteristics: Vec<String>,
    /// What this persona is typically good at.
    pub strengths: Vec<String>,
    /// Growth opportunities for this persona.
    pub opportunities: Vec<String>,
}

/// One weighted indicator condition over a named metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaSignal {
    /// Canonical metric name the condition reads.
    pub metric: String,
    /// Direction of the comparison.
    pub op: SignalOp,
    /// Boundary value the metric is compared against.
    pub value: f64,
    /// Relative weight of this signal within the persona.
    pub weight: f64,
}

/// Comparison direction of a [`PersonaSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalOp {
    /// Signal matches when `metric >= value`.
    AtLeast,
    /// Signal matches when `metric <= value`.
    AtMost,
}

impl PersonaSignal {
    /// Whether the signal matches the given metric value.
    pub fn matches(&self, metric_value: f64) -> bool {
        match self.op {
            SignalOp::AtLeast => metric_value >= self.value,
            SignalOp::AtMost => metric_value <= self.value,
        }
    }
}

/// Summary of changes performed during normalization.
///
/// All counters are additive for the processed config.
#[derive(Debug, Default)]
pub struct NormalizationReport {
    /// Number of persona keys that changed when lowercasing/trimming.
    pub personas_renamed: usize,
    /// Count of persona signals dropped due to unknown metrics (Drop policy).
    pub signals_dropped_unknown_metric: usize,
    /// Count of improvement-tactic entries dropped due to unknown metrics.
    pub tactics_dropped_unknown_metric: usize,
    /// Count of removed duplicate tactic strings after normalization.
    pub tactics_deduped: usize,
}

impl ScoringConfig {
    /// The size bracket a merchant with the given monthly revenue falls into.
    ///
    /// Brackets are ordered; the first bracket whose upper bound exceeds the
    /// revenue wins, and the open-ended final bracket catches the rest.
    pub fn bracket_for(&self, monthly_revenue: f64) -> &SizeBracket {
        self.size_brackets
            .iter()
            .find(|b| b.max_monthly_revenue.is_none_or(|max| monthly_revenue < max))
            .unwrap_or_else(|| {
                // Normalization guarantees a non-empty bracket list.
                self.size_brackets
                    .last()
                    .expect("size_brackets validated non-empty")
            })
    }
}

/// Normalize a scoring config in-place with an explicit unknown-metric policy.
///
/// What normalization does:
/// - Lowercase + trim persona and bracket codes; reject duplicates
/// - Validate threshold ordering (0 <= warning <= strength <= 100)
/// - Validate bracket ordering (ascending, open-ended bracket last)
/// - Validate stage ordering (ascending revenue boundaries)
/// - Enforce signal metrics are known (`Drop` vs `Error`), weights positive
/// - Deduplicate improvement tactics preserving first occurrence
///
/// Returns a [`NormalizationReport`] detailing the changes made.
pub fn normalize_scoring_config_with_policy(
    cfg: &mut ScoringConfig,
    policy: UnknownMetricPolicy,
) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    cfg.version = cfg.version.trim().to_string();
    if cfg.version.is_empty() {
        bail!("scoring config version cannot be empty");
    }

    let t = &cfg.thresholds;
    if !(0.0..=100.0).contains(&t.warning_percentile)
        || !(0.0..=100.0).contains(&t.strength_percentile)
        || t.warning_percentile > t.strength_percentile
    {
        bail!(
            "thresholds must satisfy 0 <= warning ({}) <= strength ({}) <= 100",
            t.warning_percentile,
            t.strength_percentile
        );
    }

    // --- size brackets
    if cfg.size_brackets.is_empty() {
        bail!("at least one size bracket is required");
    }
    let mut seen_brackets = HashSet::new();
    let mut prev_max: Option<f64> = None;
    let last_idx = cfg.size_brackets.len() - 1;
    for (i, bracket) in cfg.size_brackets.iter_mut().enumerate() {
        bracket.name = bracket.name.trim().to_lowercase();
        if bracket.name.is_empty() {
            bail!("size bracket name cannot be empty after trimming");
        }
        if !seen_brackets.insert(bracket.name.clone()) {
            bail!("duplicate size bracket after normalization: {}", bracket.name);
        }
        match bracket.max_monthly_revenue {
            Some(max) => {
                if max <= 0.0 || !max.is_finite() {
                    bail!("size bracket '{}' has a non-positive bound", bracket.name);
                }
                if let Some(prev) = prev_max {
                    if max <= prev {
                        bail!("size brackets must be strictly ascending");
                    }
                }
                prev_max = Some(max);
            }
            None => {
                if i != last_idx {
                    bail!("only the last size bracket may be open-ended");
                }
            }
        }
    }

    // --- maturity stages
    if cfg.maturity_stages.is_empty() {
        bail!("at least one maturity stage is required");
    }
    let mut prev_revenue = f64::NEG_INFINITY;
    for stage in &mut cfg.maturity_stages {
        stage.name = stage.name.trim().to_string();
        if stage.name.is_empty() {
            bail!("maturity stage name cannot be empty after trimming");
        }
        if stage.min_monthly_revenue < prev_revenue {
            bail!("maturity stages must be ordered by ascending revenue boundary");
        }
        prev_revenue = stage.min_monthly_revenue;
        for req in &mut stage.next_stage_requirements {
            *req = req.trim().to_string();
        }
    }

    // --- personas
    let mut rebuilt: IndexMap<String, PersonaRule> = IndexMap::new();
    let old = mem::take(&mut cfg.personas);
    for (raw_code, mut rule) in old {
        let code = raw_code.trim().to_lowercase();
        if code.is_empty() {
            bail!("persona code cannot be empty after trimming");
        }
        if code != raw_code {
            report.personas_renamed += 1;
        }
        if rebuilt.contains_key(&code) {
            bail!("duplicate persona code after normalization: {code}");
        }

        let mut kept_signals = Vec::with_capacity(rule.signals.len());
        for mut signal in mem::take(&mut rule.signals) {
            signal.metric = signal.metric.trim().to_lowercase();
            if !KNOWN_METRICS.contains(&signal.metric.as_str()) {
                match policy {
                    UnknownMetricPolicy::Drop => {
                        report.signals_dropped_unknown_metric += 1;
                        continue;
                    }
                    UnknownMetricPolicy::Error => {
                        bail!(
                            "persona '{code}' signal references unknown metric '{}'",
                            signal.metric
                        );
                    }
                }
            }
            if !(signal.weight > 0.0) || !signal.weight.is_finite() {
                bail!("persona '{code}' signal on '{}' needs a positive weight", signal.metric);
            }
            if !signal.value.is_finite() {
                bail!("persona '{code}' signal on '{}' has a non-finite value", signal.metric);
            }
            kept_signals.push(signal);
        }
        if kept_signals.is_empty() {
            bail!("persona '{code}' has no usable signals");
        }
        rule.signals = kept_signals;
        rule.label = rule.label.trim().to_string();
        if rule.label.is_empty() {
            bail!("persona '{code}' label cannot be empty");
        }
        rebuilt.insert(code, rule);
    }
    if rebuilt.is_empty() {
        bail!("at least one persona is required");
    }
    cfg.personas = rebuilt;

    // --- improvement tactics
    let mut rebuilt_tactics: IndexMap<String, Vec<String>> = IndexMap::new();
    let old = mem::take(&mut cfg.improvement_tactics);
    for (raw_metric, tactics) in old {
        let metric = raw_metric.trim().to_lowercase();
        if !KNOWN_METRICS.contains(&metric.as_str()) {
            match policy {
                UnknownMetricPolicy::Drop => {
                    report.tactics_dropped_unknown_metric += 1;
                    continue;
                }
                UnknownMetricPolicy::Error => {
                    bail!("improvement tactics reference unknown metric '{metric}'");
                }
            }
        }
        let before_len = tactics.len();
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(before_len);
        for tactic in tactics {
            let tactic = tactic.trim().to_string();
            if tactic.is_empty() {
                bail!("improvement tactic for '{metric}' cannot be empty");
            }
            if seen.insert(tactic.clone()) {
                out.push(tactic);
            }
        }
        report.tactics_deduped += before_len.saturating_sub(out.len());
        rebuilt_tactics.insert(metric, out);
    }
    cfg.improvement_tactics = rebuilt_tactics;

    Ok(report)
}

/// Normalize with [`UnknownMetricPolicy::Drop`] so unknown metrics are
/// silently dropped (and counted).
pub fn normalize_scoring_config(cfg: &mut ScoringConfig) -> anyhow::Result<NormalizationReport> {
    normalize_scoring_config_with_policy(cfg, UnknownMetricPolicy::Drop)
}

/// Parse and normalize a scoring config from a TOML string.
pub fn load_scoring_config_str(toml_str: &str) -> anyhow::Result<ScoringConfig> {
    let mut cfg: ScoringConfig = from_str(toml_str).context("failed to parse scoring TOML")?;
    let _report = normalize_scoring_config(&mut cfg).context("normalize_scoring_config failed")?;
    Ok(cfg)
}

/// Read a scoring config TOML file from disk, parse, and normalize it.
pub fn load_scoring_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<ScoringConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read scoring config {}", path.as_ref().display()))?;
    load_scoring_config_str(&text)
}

impl Default for ScoringConfig {
    /// The documented default profile. Persona indicator values follow the
    /// published persona definitions; maturity boundaries follow the stage
    /// guidance ($10k/$50k/$200k monthly revenue, 200/1,000/5,000 customers).
    fn default() -> Self {
        let personas = IndexMap::from([
            (
                "discount_discounter".to_string(),
                PersonaRule {
                    label: "Discount Discounter".into(),
                    description: "Heavy reliance on discounts and promotions to drive sales".into(),
                    signals: vec![
                        PersonaSignal { metric: "discount_frequency".into(), op: SignalOp::AtLeast, value: 0.30, weight: 2.0 },
                        PersonaSignal { metric: "aov".into(), op: SignalOp::AtMost, value: 60.0, weight: 1.0 },
                    ],
                    characteristics: vec![
                        "High discount frequency in campaigns".into(),
                        "Price-sensitive customer base".into(),
                        "Focus on promotional strategies".into(),
                    ],
                    strengths: vec![
                        "Effective at acquiring new customers".into(),
                        "High conversion on promotional campaigns".into(),
                    ],
                    opportunities: vec![
                        "Build brand loyalty beyond discounts".into(),
                        "Increase average order value".into(),
                        "Develop VIP segment programs".into(),
                    ],
                },
            ),
            (
                "brand_builder".to_string(),
                PersonaRule {
                    label: "Brand Builder".into(),
                    description: "Strong brand loyalty and repeat customers".into(),
                    signals: vec![
                        PersonaSignal { metric: "repeat_purchase_rate".into(), op: SignalOp::AtLeast, value: 2.5, weight: 2.0 },
                        PersonaSignal { metric: "ltv".into(), op: SignalOp::AtLeast, value: 300.0, weight: 1.0 },
                    ],
                    characteristics: vec![
                        "High repeat purchase rate".into(),
                        "Strong customer loyalty".into(),
                        "Above-average customer lifetime value".into(),
                    ],
                    strengths: vec![
                        "Strong brand equity".into(),
                        "Loyal customer base".into(),
                        "Sustainable revenue growth".into(),
                    ],
                    opportunities: vec![
                        "Expand customer acquisition".into(),
                        "Launch referral programs".into(),
                        "Increase market share".into(),
                    ],
                },
            ),
            (
                "lifecycle_master".to_string(),
                PersonaRule {
                    label: "Lifecycle Master".into(),
                    description: "Sophisticated automated email marketing across the lifecycle".into(),
                    signals: vec![
                        PersonaSignal { metric: "campaign_engagement".into(), op: SignalOp::AtLeast, value: 0.25, weight: 2.0 },
                        PersonaSignal { metric: "email_subscriber_count".into(), op: SignalOp::AtLeast, value: 2_000.0, weight: 1.0 },
                    ],
                    characteristics: vec![
                        "High campaign engagement".into(),
                        "Sophisticated email marketing".into(),
                        "Strong retention focus".into(),
                    ],
                    strengths: vec![
                        "Effective lifecycle campaigns".into(),
                        "High email engagement".into(),
                        "Data-driven marketing".into(),
                    ],
                    opportunities: vec![
                        "Scale successful campaigns".into(),
                        "Test advanced automation".into(),
                        "Expand to new channels".into(),
                    ],
                },
            ),
            (
                "segment_specialist".to_string(),
                PersonaRule {
                    label: "Segment Specialist".into(),
                    description: "Targeted campaigns over well-maintained customer segments".into(),
                    signals: vec![
                        PersonaSignal { metric: "email_subscriber_count".into(), op: SignalOp::AtLeast, value: 5_000.0, weight: 1.5 },
                        PersonaSignal { metric: "campaign_engagement".into(), op: SignalOp::AtLeast, value: 0.18, weight: 1.0 },
                    ],
                    characteristics: vec![
                        "Multiple active campaigns".into(),
                        "Targeted customer segments".into(),
                        "Personalized approach".into(),
                    ],
                    strengths: vec![
                        "Advanced segmentation".into(),
                        "Personalized customer experience".into(),
                        "High conversion rates".into(),
                    ],
                    opportunities: vec![
                        "Automate segmentation".into(),
                        "Implement predictive modeling".into(),
                        "Cross-channel campaigns".into(),
                    ],
                },
            ),
            (
                "product_pusher".to_string(),
                PersonaRule {
                    label: "Product Pusher".into(),
                    description: "Wide product catalog with a volume-focused approach".into(),
                    signals: vec![
                        PersonaSignal { metric: "campaign_engagement".into(), op: SignalOp::AtMost, value: 0.15, weight: 1.0 },
                        PersonaSignal { metric: "discount_frequency".into(), op: SignalOp::AtMost, value: 0.30, weight: 1.0 },
                        PersonaSignal { metric: "total_orders".into(), op: SignalOp::AtLeast, value: 100.0, weight: 0.5 },
                    ],
                    characteristics: vec![
                        "Focus on product variety".into(),
                        "Broad catalog management".into(),
                        "Average engagement metrics".into(),
                    ],
                    strengths: vec![
                        "Diverse product offerings".into(),
                        "Wide market appeal".into(),
                    ],
                    opportunities: vec![
                        "Improve customer segmentation".into(),
                        "Personalize marketing messages".into(),
                        "Optimize product recommendations".into(),
                    ],
                },
            ),
        ]);

        let improvement_tactics = IndexMap::from([
            (
                "aov".to_string(),
                vec!["Bundles".to_string(), "Upsells".to_string(), "Free-shipping thresholds".to_string()],
            ),
            (
                "ltv".to_string(),
                vec!["Loyalty".to_string(), "Retention".to_string(), "Subscription offers".to_string()],
            ),
            (
                "repeat_purchase_rate".to_string(),
                vec!["Post-purchase flows".to_string(), "Replenishment reminders".to_string()],
            ),
            (
                "campaign_engagement".to_string(),
                vec!["Subject line testing".to_string(), "List hygiene".to_string(), "Send-time optimization".to_string()],
            ),
        ]);

        ScoringConfig {
            version: "rules-v1".into(),
            thresholds: InsightThresholds {
                strength_percentile: 75.0,
                warning_percentile: 25.0,
            },
            size_brackets: vec![
                SizeBracket { name: "small".into(), max_monthly_revenue: Some(10_000.0) },
                SizeBracket { name: "mid".into(), max_monthly_revenue: Some(100_000.0) },
                SizeBracket { name: "large".into(), max_monthly_revenue: None },
            ],
            maturity_stages: vec![
                MaturityStage {
                    name: "Startup".into(),
                    min_monthly_revenue: 0.0,
                    min_customers: 0,
                    next_stage_requirements: vec![
                        "Reach $10,000+ monthly revenue".into(),
                        "Build customer base to 200+".into(),
                        "Achieve positive unit economics".into(),
                        "Implement basic email automation".into(),
                    ],
                },
                MaturityStage {
                    name: "Growth".into(),
                    min_monthly_revenue: 10_000.0,
                    min_customers: 200,
                    next_stage_requirements: vec![
                        "Reach $50,000+ monthly revenue".into(),
                        "Scale to 1,000+ customers".into(),
                        "Implement advanced segmentation".into(),
                        "Build retention programs".into(),
                    ],
                },
                MaturityStage {
                    name: "Scale-Up".into(),
                    min_monthly_revenue: 50_000.0,
                    min_customers: 1_000,
                    next_stage_requirements: vec![
                        "Reach $200,000+ monthly revenue".into(),
                        "Build multi-channel presence".into(),
                        "Implement predictive analytics".into(),
                        "Scale operations efficiently".into(),
                    ],
                },
                MaturityStage {
                    name: "Mature".into(),
                    min_monthly_revenue: 200_000.0,
                    min_customers: 5_000,
                    next_stage_requirements: vec![
                        "Maintain market leadership".into(),
                        "Innovate new product lines".into(),
                        "Expand to new markets".into(),
                        "Optimize lifetime value".into(),
                    ],
                },
            ],
            personas,
            improvement_tactics,
        }
    }
}
