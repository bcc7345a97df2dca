use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;

use crate::{
    gateway::{
        CampaignGateway,
        errors::{GatewayError, GatewayInitError},
        klaviyo_rest::{params::build_campaign_body, response::CampaignCreateResponse},
    },
    models::{CampaignPayload, DispatchResult},
};

const BASE_URL: &str = "https://a.klaviyo.com/api";

/// Klaviyo requires a pinned API revision on every request.
const API_REVISION: &str = "2024-10-15";

/// Upper bound on any single vendor call, so a slow dependency cannot hang
/// the dispatching request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KlaviyoGateway {
    client: Client,
    limiter: DefaultDirectRateLimiter,
    _api_key: SecretString,
}

impl KlaviyoGateway {
    /// Creates a gateway bound to one account's API key.
    ///
    /// The key ends up in a default `Authorization` header marked sensitive;
    /// requests share a client with a fixed timeout and a small client-side
    /// rate limiter (Klaviyo throttles bursty campaign creation).
    pub fn new(api_key: SecretString) -> Result<Self, GatewayInitError> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!(
            "Klaviyo-API-Key {}",
            api_key.expose_secret()
        ))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert("revision", header::HeaderValue::from_static(API_REVISION));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            limiter: RateLimiter::direct(Quota::per_second(nonzero!(3u32))),
            _api_key: api_key,
        })
    }

    /// Creates a gateway from the `KLAVIYO_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, GatewayInitError> {
        let api_key = SecretString::new(get_env_var("KLAVIYO_API_KEY")?.into());
        Self::new(api_key)
    }
}

/// Maps a non-success vendor status to the matching [`GatewayError`] variant.
pub(crate) fn classify_error(
    status: u16,
    retry_after_secs: Option<u64>,
    message: String,
) -> GatewayError {
    match status {
        401 | 403 => GatewayError::AuthRejected,
        429 => GatewayError::RateLimited { retry_after_secs },
        _ => GatewayError::Api { status, message },
    }
}

fn parse_retry_after(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

#[async_trait]
impl CampaignGateway for KlaviyoGateway {
    async fn send(
        &self,
        payload: &CampaignPayload,
        target_list_id: &str,
    ) -> Result<DispatchResult, GatewayError> {
        // Validate and render locally before spending a request.
        let body = build_campaign_body(payload, target_list_id)?;

        self.limiter.until_ready().await;

        let response = self
            .client
            .post(format!("{BASE_URL}/campaigns"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(classify_error(status.as_u16(), retry_after, message));
        }

        // A success status with an unparseable body still counts as accepted;
        // the campaign exists vendor-side even if we could not learn its id.
        match response.json::<CampaignCreateResponse>().await {
            Ok(parsed) => Ok(DispatchResult {
                accepted: true,
                remote_id: Some(parsed.data.id),
            }),
            Err(_) => Ok(DispatchResult {
                accepted: true,
                remote_id: None,
            }),
        }
    }

    async fn validate_connection(&self) -> Result<(), GatewayError> {
        self.limiter.until_ready().await;

        let response = self.client.get(format!("{BASE_URL}/lists")).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let retry_after = parse_retry_after(response.headers());
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown API error".to_string());
        Err(classify_error(status.as_u16(), retry_after, message))
    }
}
