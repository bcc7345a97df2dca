//! Canonical in-memory representation of an outbound email campaign.
//!
//! This struct is the standard input for all [`CampaignGateway`](crate::gateway::CampaignGateway)
//! implementations, regardless of the vendor the campaign is ultimately sent
//! through. The strategy layer constructs it from a strategy record; this
//! crate only validates and transmits it.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, Snafu, ensure};

/// Vendors commonly reject campaign names longer than this.
const MAX_NAME_LEN: usize = 255;

/// Subject lines beyond this length are truncated or rejected by most ESPs.
const MAX_SUBJECT_LEN: usize = 200;

/// Errors raised while validating or rendering a campaign payload.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PayloadError {
    /// A required campaign field was empty after trimming.
    #[snafu(display("campaign field `{field}` must not be empty"))]
    EmptyField {
        field: &'static str,
        backtrace: Backtrace,
    },

    /// A campaign field exceeded the vendor-safe length limit.
    #[snafu(display("campaign field `{field}` exceeds {max} characters"))]
    FieldTooLong {
        field: &'static str,
        max: usize,
        backtrace: Backtrace,
    },
}

/// A vendor-agnostic email campaign, ready for dispatch.
///
/// `tags` carries ordered key/value labels (e.g. UTM parameters or the
/// originating strategy code) that vendors accept as campaign metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignPayload {
    /// Internal campaign name shown in the vendor dashboard.
    pub name: String,

    /// Subject line of the email.
    pub subject: String,

    /// Optional preheader/preview text.
    pub preview_text: Option<String>,

    /// Campaign body (plain text or simple HTML, vendor-dependent).
    pub body: String,

    /// Ordered campaign metadata labels.
    #[serde(default)]
    pub tags: IndexMap<String, String>,

    /// Optional scheduled send time (UTC). `None` means "send immediately".
    pub send_at: Option<DateTime<Utc>>,
}

impl CampaignPayload {
    /// Checks the payload against vendor-safe constraints.
    ///
    /// Gateways call this before constructing a request so that a malformed
    /// payload fails locally instead of burning an API call.
    pub fn validate(&self) -> Result<(), PayloadError> {
        ensure!(!self.name.trim().is_empty(), EmptyFieldSnafu { field: "name" });
        ensure!(
            self.name.len() <= MAX_NAME_LEN,
            FieldTooLongSnafu {
                field: "name",
                max: MAX_NAME_LEN
            }
        );
        ensure!(
            !self.subject.trim().is_empty(),
            EmptyFieldSnafu { field: "subject" }
        );
        ensure!(
            self.subject.len() <= MAX_SUBJECT_LEN,
            FieldTooLongSnafu {
                field: "subject",
                max: MAX_SUBJECT_LEN
            }
        );
        ensure!(!self.body.trim().is_empty(), EmptyFieldSnafu { field: "body" });
        Ok(())
    }
}
