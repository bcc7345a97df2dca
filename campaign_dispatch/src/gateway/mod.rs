//! Gateway abstraction for external marketing channels.
//!
//! This module defines the [`CampaignGateway`] trait, a unified interface for
//! pushing a finished [`CampaignPayload`](crate::models::CampaignPayload) to
//! any email-marketing vendor (e.g. Klaviyo, Mailchimp).
//!
//! Each concrete implementation handles vendor-specific endpoints, auth and
//! error classification. Credentials are bound at construction time so a
//! gateway instance is always scoped to a single merchant account.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn CampaignGateway`) so the strategy layer can be tested against a fake.

pub mod errors;
pub mod klaviyo_rest;

use async_trait::async_trait;

use crate::{
    gateway::errors::GatewayError,
    models::{CampaignPayload, DispatchResult},
};

#[async_trait]
pub trait CampaignGateway {
    /// Sends the campaign to the given vendor-side audience list.
    ///
    /// Implementations must classify failures into the distinct
    /// [`GatewayError`] variants so callers can tell an auth problem from a
    /// rate limit from an outage.
    async fn send(
        &self,
        payload: &CampaignPayload,
        target_list_id: &str,
    ) -> Result<DispatchResult, GatewayError>;

    /// Cheap credential check against the vendor API.
    async fn validate_connection(&self) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AcceptingGateway;
    struct DecliningGateway;

    #[async_trait]
    impl CampaignGateway for AcceptingGateway {
        async fn send(
            &self,
            _payload: &CampaignPayload,
            _target_list_id: &str,
        ) -> Result<DispatchResult, GatewayError> {
            Ok(DispatchResult {
                accepted: true,
                remote_id: Some("CMP-1".into()),
            })
        }

        async fn validate_connection(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[async_trait]
    impl CampaignGateway for DecliningGateway {
        async fn send(
            &self,
            _payload: &CampaignPayload,
            _target_list_id: &str,
        ) -> Result<DispatchResult, GatewayError> {
            Ok(DispatchResult {
                accepted: false,
                remote_id: None,
            })
        }

        async fn validate_connection(&self) -> Result<(), GatewayError> {
            Err(GatewayError::AuthRejected)
        }
    }

    fn get_gateway(vendor: &str) -> Box<dyn CampaignGateway + Send + Sync> {
        if vendor == "accepting" {
            Box::new(AcceptingGateway)
        } else {
            Box::new(DecliningGateway)
        }
    }

    #[tokio::test]
    async fn dynamic_gateway_dispatch() {
        let gateway = get_gateway("accepting");

        let payload = CampaignPayload {
            name: "Test".into(),
            subject: "Test".into(),
            preview_text: None,
            body: "Body".into(),
            tags: Default::default(),
            send_at: None,
        };

        let result = gateway.send(&payload, "LIST-1").await.unwrap();
        assert!(result.accepted);
        assert_eq!(result.remote_id.as_deref(), Some("CMP-1"));

        let declining = get_gateway("declining");
        let result = declining.send(&payload, "LIST-1").await.unwrap();
        assert!(!result.accepted);
    }
}
