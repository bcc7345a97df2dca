use serde_json::{Value, json};

use crate::models::{CampaignPayload, PayloadError};

/// Builds the JSON:API request body Klaviyo expects for campaign creation.
///
/// Validates the payload first so an empty or overlong field fails locally
/// with a [`PayloadError`] instead of a vendor 400.
pub fn build_campaign_body(
    payload: &CampaignPayload,
    target_list_id: &str,
) -> Result<Value, PayloadError> {
    payload.validate()?;

    let mut attributes = json!({
        "name": payload.name,
        "audiences": { "included": [target_list_id] },
        "campaign-messages": {
            "data": [{
                "type": "campaign-message",
                "attributes": {
                    "channel": "email",
                    "label": payload.name,
                    "content": {
                        "subject": payload.subject,
                        "preview_text": payload.preview_text,
                        "body": payload.body,
                    }
                }
            }]
        }
    });

    if let Some(send_at) = payload.send_at {
        attributes["send_strategy"] = json!({
            "method": "static",
            "options_static": { "datetime": send_at.to_rfc3339() }
        });
    }

    if !payload.tags.is_empty() {
        attributes["tags"] = json!(payload.tags);
    }

    Ok(json!({
        "data": {
            "type": "campaign",
            "attributes": attributes,
        }
    }))
}
