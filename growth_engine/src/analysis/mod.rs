//! Analysis orchestration: compute-or-reuse per merchant per kind.
//!
//! ## Caching contract
//! `analyze` returns the stored result untouched — no recomputation, no
//! write — whenever the caller did not force a refresh and the stored result
//! is still fresh (computed at or after the merchant's last metric sync).
//! Repeated calls are therefore cheap and idempotent.
//!
//! ## Recompute path
//! Validate the metric snapshot (before any write), derive the peer key,
//! fetch aggregates, run the pure scoring engine, and overwrite the stored
//! result in one atomic upsert. For fixed metrics and peer data the payload
//! is byte-identical across recomputations; `computed_at` is row metadata,
//! not part of the payload.

use chrono::Utc;
use diesel::SqliteConnection;
use tracing::info;

use crate::{
    config::scoring::ScoringConfig,
    error::{EngineError, EngineResult},
    kind::AnalysisKind,
    models::{
        analysis::{AnalysisResultRow, NewAnalysisResult},
        merchant::{MerchantRow, MetricSnapshot},
    },
    peers::{PeerAggregateProvider, PeerKey},
    scoring,
    store::{MerchantStore, ResultStore},
    time,
};

/// What `analyze` returned and whether it had to compute it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    /// The current result row for (merchant, kind).
    pub result: AnalysisResultRow,
    /// False on a pure cache hit; true when the engine recomputed.
    pub recomputed: bool,
}

/// A stored result is fresh iff it was computed at or after the last metric
/// sync. Unparseable timestamps count as stale, which forces a recompute
/// instead of serving a result of unknown age.
fn is_fresh(result: &AnalysisResultRow, merchant: &MerchantRow) -> bool {
    let Some(synced_raw) = merchant.metrics_synced_at.as_deref() else {
        // Metrics never synced: nothing newer exists to invalidate the cache.
        return true;
    };
    match (
        time::parse_rfc3339(&result.computed_at),
        time::parse_rfc3339(synced_raw),
    ) {
        (Some(computed), Some(synced)) => computed >= synced,
        _ => false,
    }
}

/// Computes or reuses the analysis of `kind` for the merchant.
///
/// Errors: unknown merchant -> `NotFound`; missing/negative metric ->
/// `Validation` naming the field; peer aggregate failure ->
/// `DependencyUnavailable` (never a defaulted score).
pub fn analyze<S>(
    conn: &mut SqliteConnection,
    store: &S,
    peers: &dyn PeerAggregateProvider,
    cfg: &ScoringConfig,
    merchant_code: &str,
    kind: AnalysisKind,
    force_refresh: bool,
) -> EngineResult<AnalysisOutcome>
where
    S: MerchantStore + ResultStore,
{
    let merchant = store.merchant_by_code(conn, merchant_code)?;
    let existing = store.latest_result(conn, merchant.id, kind)?;

    if !force_refresh {
        if let Some(result) = existing {
            if is_fresh(&result, &merchant) {
                info!(merchant = %merchant.merchant_code, %kind, "analysis cache hit");
                return Ok(AnalysisOutcome {
                    result,
                    recomputed: false,
                });
            }
        }
    }

    // Validation happens before any write.
    let metrics = MetricSnapshot::from_row(&merchant)?;
    let peer_key = PeerKey::for_merchant(&merchant.vertical, metrics.monthly_revenue, cfg);

    let aggregates =
        peers
            .aggregates(conn, &peer_key)
            .map_err(|e| EngineError::DependencyUnavailable {
                dependency: "peer aggregates",
                reason: e.to_string(),
            })?;

    let payload_json = match kind {
        AnalysisKind::Discovery => {
            let payload = scoring::score_discovery(&metrics, &aggregates, cfg)?;
            serde_json::to_string(&payload)?
        }
        AnalysisKind::Benchmark => {
            let payload =
                scoring::score_benchmark(&metrics, &peer_key.to_string(), &aggregates, cfg)?;
            serde_json::to_string(&payload)?
        }
    };

    let computed_at = time::to_rfc3339_millis(Utc::now());
    let row = NewAnalysisResult {
        merchant_id: merchant.id,
        kind: kind.as_str(),
        payload: &payload_json,
        config_version: Some(&cfg.version),
        computed_at: &computed_at,
    };
    let result = store.upsert_result(conn, &row)?;

    info!(
        merchant = %merchant.merchant_code,
        %kind,
        peer_group = %peer_key,
        "analysis recomputed"
    );

    Ok(AnalysisOutcome {
        result,
        recomputed: true,
    })
}
