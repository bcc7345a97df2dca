use serde::Deserialize;

/// Envelope Klaviyo returns from `POST /api/campaigns`.
#[derive(Debug, Deserialize)]
pub struct CampaignCreateResponse {
    pub data: CampaignData,
}

/// The single resource object inside a campaign-create response.
///
/// Klaviyo returns more attributes than this; only the fields the dispatch
/// flow consumes are modeled.
#[derive(Debug, Deserialize)]
pub struct CampaignData {
    /// Vendor-side campaign identifier.
    pub id: String,
}
