//! Deployment: push an active strategy into the external marketing channel.
//!
//! Deploy is not a status transition. Implement moves recommended -> active;
//! deploy dispatches an *active* strategy through the gateway and records
//! the vendor receipt on the row. On any gateway failure — including a
//! vendor that answers but declines — the strategy row is left untouched
//! and the error is surfaced as retryable; this component never retries on
//! its own.

use campaign_dispatch::{
    gateway::CampaignGateway,
    models::{CampaignPayload, DispatchResult},
};
use diesel::SqliteConnection;
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::{
    error::{EngineError, EngineResult},
    models::strategy::{StrategyRow, StrategyStatus},
    store::StrategyStore,
};

/// Outcome of a successful deploy.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployReceipt {
    /// The strategy row with the recorded vendor receipt.
    pub strategy: StrategyRow,
    /// What the vendor reported.
    pub dispatch: DispatchResult,
}

/// Renders the campaign payload a strategy row describes.
pub fn build_campaign_payload(strategy: &StrategyRow) -> EngineResult<CampaignPayload> {
    let steps: Vec<String> = serde_json::from_str(&strategy.action_steps)?;

    let mut body = strategy.description.clone();
    if !steps.is_empty() {
        body.push_str("\n\nPlan:\n");
        for step in &steps {
            body.push_str("- ");
            body.push_str(step);
            body.push('\n');
        }
    }

    let tags = IndexMap::from([
        ("utm_campaign".to_string(), strategy.strategy_type.clone()),
        ("strategy_code".to_string(), strategy.strategy_code.clone()),
    ]);

    Ok(CampaignPayload {
        name: format!("{} - {}", strategy.name, strategy.strategy_code),
        subject: strategy.name.clone(),
        preview_text: None,
        body,
        tags,
        send_at: None,
    })
}

/// Dispatches an active strategy to the vendor-side audience list.
///
/// Precondition: the strategy exists and is `active` (implement first).
/// Gateway failures surface as `DependencyUnavailable` with the underlying
/// reason attached, and the strategy row is exactly as it was before the
/// call.
pub async fn deploy<S: StrategyStore>(
    conn: &mut SqliteConnection,
    store: &S,
    gateway: &(dyn CampaignGateway + Send + Sync),
    strategy_code: &str,
    target_list_id: &str,
) -> EngineResult<DeployReceipt> {
    let row = store.strategy_by_code(conn, strategy_code)?;
    match row.status_enum() {
        Some(StrategyStatus::Active) => {}
        Some(status) => {
            return Err(EngineError::Conflict {
                status,
                action: "deployed",
            });
        }
        None => {
            return Err(EngineError::Validation {
                field: "status",
                reason: format!("unrecognized stored status '{}'", row.status),
            });
        }
    }

    let payload = build_campaign_payload(&row)?;

    let dispatch = gateway
        .send(&payload, target_list_id)
        .await
        .map_err(|e| {
            warn!(strategy = %row.strategy_code, error = %e, "campaign dispatch failed");
            EngineError::DependencyUnavailable {
                dependency: "campaign gateway",
                reason: e.to_string(),
            }
        })?;

    if !dispatch.accepted {
        warn!(strategy = %row.strategy_code, "vendor declined the campaign");
        return Err(EngineError::DependencyUnavailable {
            dependency: "campaign gateway",
            reason: "vendor declined the campaign".to_string(),
        });
    }

    let strategy = store.record_deployment(conn, row.id, dispatch.remote_id.as_deref())?;

    info!(
        strategy = %strategy.strategy_code,
        remote_id = ?dispatch.remote_id,
        list = target_list_id,
        "strategy deployed"
    );

    Ok(DeployReceipt { strategy, dispatch })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> StrategyRow {
        StrategyRow {
            id: 7,
            strategy_code: "STRAT_9F3A11C0".into(),
            merchant_id: 1,
            name: "Abandoned Cart".into(),
            strategy_type: "abandoned_cart".into(),
            description: "Recover sales from abandoned shopping carts".into(),
            priority_score: 83.33,
            expected_roi: 250.0,
            estimated_revenue: 4_166.67,
            confidence: 0.75,
            action_steps: r#"["Set up cart tracking","Create 2-3 reminder emails"]"#.into(),
            effort: "medium".into(),
            timeline: "1-2 weeks".into(),
            eligible: true,
            status: "active".into(),
            remote_campaign_id: None,
            deployed_at: None,
            actual_roi: None,
            implemented_at: Some("2025-06-02T00:00:00.000Z".into()),
            completed_at: None,
            created_at: "2025-06-01T00:00:00.000Z".into(),
            updated_at: "2025-06-02T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn payload_carries_name_code_and_plan() {
        let payload = build_campaign_payload(&row()).unwrap();
        assert_eq!(payload.name, "Abandoned Cart - STRAT_9F3A11C0");
        assert_eq!(payload.subject, "Abandoned Cart");
        assert!(payload.body.contains("- Set up cart tracking"));
        assert_eq!(payload.tags["utm_campaign"], "abandoned_cart");
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn malformed_action_steps_fail_before_dispatch() {
        let mut bad = row();
        bad.action_steps = "not json".into();
        assert!(build_campaign_payload(&bad).is_err());
    }
}
