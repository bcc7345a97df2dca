use thiserror::Error;

use crate::models::PayloadError;

/// Errors that can occur within a `CampaignGateway` implementation.
///
/// Every failure mode the vendor can exhibit maps to its own variant, because
/// callers decide differently for each: retry later (rate limit / outage),
/// fix credentials (auth), or fix input (payload).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The vendor rejected the configured API credentials.
    #[error("authentication rejected by the marketing platform")]
    AuthRejected,

    /// The vendor throttled the request.
    #[error("rate limited by the marketing platform (retry after {retry_after_secs:?}s)")]
    RateLimited {
        /// Seconds to wait before retrying, when the vendor provided one.
        retry_after_secs: Option<u64>,
    },

    /// The vendor could not be reached (connect failure, timeout, TLS, DNS).
    #[error("marketing platform unreachable: {source}")]
    Unreachable {
        #[from]
        source: reqwest::Error,
    },

    /// The vendor answered with a non-success status outside the cases above.
    #[error("marketing platform returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The campaign payload failed local validation before any request.
    #[error("invalid campaign payload: {source}")]
    InvalidPayload {
        #[from]
        source: PayloadError,
    },
}

impl GatewayError {
    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited { .. } | GatewayError::Unreachable { .. }
        )
    }
}

/// Errors that can occur while constructing a gateway.
#[derive(Debug, Error)]
pub enum GatewayInitError {
    /// A credential environment variable was not set.
    #[error(transparent)]
    MissingCredentials(#[from] shared_utils::env::MissingEnvVarError),

    /// The API key contained bytes that cannot appear in an HTTP header.
    #[error("API key is not a valid header value")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
