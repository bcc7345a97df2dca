//! Merchant rows and the validated metric snapshot derived from them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{
    error::{EngineError, EngineResult},
    schema::merchants,
    time,
};

/// A row in [`crate::schema::merchants`]: one registered merchant.
///
/// Metric columns are `NULL` until the first sync from the commerce platform;
/// the engine refuses to analyze a merchant with missing metrics rather than
/// defaulting them (a zero is indistinguishable from a bad metric).
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = merchants, check_for_backend(diesel::sqlite::Sqlite))]
pub struct MerchantRow {
    /// Database primary key.
    pub id: i32,
    /// Stable external identifier (e.g., "MCH_9F3A11C0").
    pub merchant_code: String,
    /// Display name of the shop.
    pub shop_name: String,
    /// Vertical/category code, normalized lowercase (e.g., "apparel").
    pub vertical: String,
    /// Rolling monthly revenue.
    pub monthly_revenue: Option<f64>,
    /// Lifetime customer count.
    pub total_customers: Option<i32>,
    /// Lifetime order count.
    pub total_orders: Option<i32>,
    /// Average order value.
    pub aov: Option<f64>,
    /// Orders per customer.
    pub repeat_purchase_rate: Option<f64>,
    /// Average customer lifetime value.
    pub ltv: Option<f64>,
    /// Blended acquisition cost per customer.
    pub customer_acquisition_cost: Option<f64>,
    /// Size of the email subscriber list.
    pub email_subscriber_count: Option<i32>,
    /// Fraction of orders carrying a discount, 0..1.
    pub discount_frequency: Option<f64>,
    /// Mean of campaign open and click rates, 0..1.
    pub campaign_engagement: Option<f64>,
    /// Opaque API key for the email-marketing integration.
    pub dispatch_api_key: Option<String>,
    /// When metrics were last synced (RFC3339 UTC); drives staleness.
    pub metrics_synced_at: Option<String>,
    /// Row creation timestamp (RFC3339 UTC).
    pub created_at: String,
    /// Row update timestamp (RFC3339 UTC, maintained by trigger).
    pub updated_at: String,
}

/// Insertable form of [`MerchantRow`] for registration.
#[derive(Debug, Insertable)]
#[diesel(table_name = merchants)]
pub struct NewMerchant<'a> {
    /// Stable external identifier.
    pub merchant_code: &'a str,
    /// Display name of the shop.
    pub shop_name: &'a str,
    /// Vertical/category code.
    pub vertical: &'a str,
}

/// Changeset applied by a metric sync; always stamps `metrics_synced_at`.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = merchants)]
pub struct MetricsUpdate<'a> {
    /// Rolling monthly revenue.
    pub monthly_revenue: f64,
    /// Lifetime customer count.
    pub total_customers: i32,
    /// Lifetime order count.
    pub total_orders: i32,
    /// Average order value.
    pub aov: f64,
    /// Orders per customer.
    pub repeat_purchase_rate: f64,
    /// Average customer lifetime value.
    pub ltv: f64,
    /// Blended acquisition cost per customer.
    pub customer_acquisition_cost: f64,
    /// Size of the email subscriber list.
    pub email_subscriber_count: i32,
    /// Fraction of orders carrying a discount, 0..1.
    pub discount_frequency: f64,
    /// Mean of campaign open and click rates, 0..1.
    pub campaign_engagement: f64,
    /// Sync timestamp (RFC3339 UTC).
    pub metrics_synced_at: &'a str,
}

/// A fully-validated view of a merchant's metrics, ready for scoring.
///
/// Construction fails with a [`EngineError::Validation`] naming the first
/// missing or negative field, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    /// Rolling monthly revenue.
    pub monthly_revenue: f64,
    /// Lifetime customer count.
    pub total_customers: i32,
    /// Lifetime order count.
    pub total_orders: i32,
    /// Average order value.
    pub aov: f64,
    /// Orders per customer.
    pub repeat_purchase_rate: f64,
    /// Average customer lifetime value.
    pub ltv: f64,
    /// Blended acquisition cost per customer.
    pub customer_acquisition_cost: f64,
    /// Size of the email subscriber list.
    pub email_subscriber_count: i32,
    /// Fraction of orders carrying a discount, 0..1.
    pub discount_frequency: f64,
    /// Mean of campaign open and click rates, 0..1.
    pub campaign_engagement: f64,
    /// When these metrics were synced (UTC).
    pub synced_at: DateTime<Utc>,
}

fn require_f64(value: Option<f64>, field: &'static str) -> EngineResult<f64> {
    let v = value.ok_or(EngineError::missing_metric(field))?;
    if !v.is_finite() || v < 0.0 {
        return Err(EngineError::Validation {
            field,
            reason: format!("must be a non-negative number, got {v}"),
        });
    }
    Ok(v)
}

fn require_i32(value: Option<i32>, field: &'static str) -> EngineResult<i32> {
    let v = value.ok_or(EngineError::missing_metric(field))?;
    if v < 0 {
        return Err(EngineError::Validation {
            field,
            reason: format!("must be non-negative, got {v}"),
        });
    }
    Ok(v)
}

impl MetricSnapshot {
    /// Validates a merchant row into a snapshot, naming the first bad field.
    pub fn from_row(row: &MerchantRow) -> EngineResult<Self> {
        let synced_at = row
            .metrics_synced_at
            .as_deref()
            .and_then(time::parse_rfc3339)
            .ok_or(EngineError::missing_metric("metrics_synced_at"))?;

        Ok(MetricSnapshot {
            monthly_revenue: require_f64(row.monthly_revenue, "monthly_revenue")?,
            total_customers: require_i32(row.total_customers, "total_customers")?,
            total_orders: require_i32(row.total_orders, "total_orders")?,
            aov: require_f64(row.aov, "aov")?,
            repeat_purchase_rate: require_f64(row.repeat_purchase_rate, "repeat_purchase_rate")?,
            ltv: require_f64(row.ltv, "ltv")?,
            customer_acquisition_cost: require_f64(
                row.customer_acquisition_cost,
                "customer_acquisition_cost",
            )?,
            email_subscriber_count: require_i32(
                row.email_subscriber_count,
                "email_subscriber_count",
            )?,
            discount_frequency: require_f64(row.discount_frequency, "discount_frequency")?,
            campaign_engagement: require_f64(row.campaign_engagement, "campaign_engagement")?,
            synced_at,
        })
    }

    /// The metrics scored against the peer group, in presentation order.
    pub fn tracked_metrics(&self) -> [(&'static str, f64); 4] {
        [
            ("aov", self.aov),
            ("ltv", self.ltv),
            ("repeat_purchase_rate", self.repeat_purchase_rate),
            ("campaign_engagement", self.campaign_engagement),
        ]
    }

    /// Looks up any metric by its canonical name (classification rules refer
    /// to metrics by name in configuration).
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "monthly_revenue" => Some(self.monthly_revenue),
            "total_customers" => Some(self.total_customers as f64),
            "total_orders" => Some(self.total_orders as f64),
            "aov" => Some(self.aov),
            "repeat_purchase_rate" => Some(self.repeat_purchase_rate),
            "ltv" => Some(self.ltv),
            "customer_acquisition_cost" => Some(self.customer_acquisition_cost),
            "email_subscriber_count" => Some(self.email_subscriber_count as f64),
            "discount_frequency" => Some(self.discount_frequency),
            "campaign_engagement" => Some(self.campaign_engagement),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn full_row() -> MerchantRow {
        MerchantRow {
            id: 1,
            merchant_code: "MCH_1".into(),
            shop_name: "Shop".into(),
            vertical: "apparel".into(),
            monthly_revenue: Some(25_000.0),
            total_customers: Some(800),
            total_orders: Some(1_900),
            aov: Some(62.0),
            repeat_purchase_rate: Some(2.4),
            ltv: Some(210.0),
            customer_acquisition_cost: Some(18.0),
            email_subscriber_count: Some(4_200),
            discount_frequency: Some(0.22),
            campaign_engagement: Some(0.19),
            dispatch_api_key: None,
            metrics_synced_at: Some("2025-06-01T00:00:00.000Z".into()),
            created_at: "2025-01-01T00:00:00.000Z".into(),
            updated_at: "2025-06-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn snapshot_from_complete_row() {
        let snap = MetricSnapshot::from_row(&full_row()).expect("valid snapshot");
        assert_eq!(snap.aov, 62.0);
        assert_eq!(
            snap.synced_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_field_is_named() {
        let mut row = full_row();
        row.ltv = None;
        let err = MetricSnapshot::from_row(&row).unwrap_err();
        match err {
            EngineError::Validation { field, .. } => assert_eq!(field, "ltv"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn negative_metric_is_rejected() {
        let mut row = full_row();
        row.aov = Some(-5.0);
        let err = MetricSnapshot::from_row(&row).unwrap_err();
        match err {
            EngineError::Validation { field, .. } => assert_eq!(field, "aov"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn never_synced_metrics_are_a_validation_error() {
        let mut row = full_row();
        row.metrics_synced_at = None;
        let err = MetricSnapshot::from_row(&row).unwrap_err();
        match err {
            EngineError::Validation { field, .. } => assert_eq!(field, "metrics_synced_at"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
