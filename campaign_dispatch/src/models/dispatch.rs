//! Outcome of handing a campaign to an external vendor.

use serde::{Deserialize, Serialize};

/// What the vendor reported back for a dispatched campaign.
///
/// `accepted == false` with an `Ok` return means the vendor answered but
/// declined the campaign without a classifiable error; callers treat it the
/// same as a dependency failure and must not advance any local state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Whether the vendor accepted the campaign for delivery.
    pub accepted: bool,

    /// Vendor-side campaign identifier, when one was issued.
    pub remote_id: Option<String>,
}
