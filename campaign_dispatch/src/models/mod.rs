pub mod dispatch;
pub mod payload;

pub use dispatch::DispatchResult;
pub use payload::{CampaignPayload, PayloadError};
