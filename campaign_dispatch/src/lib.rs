//! Dispatch of approved growth strategies to external marketing channels.
//!
//! This crate owns the outbound side of the system: the [`gateway::CampaignGateway`]
//! trait that abstracts over email-marketing vendors, the concrete Klaviyo REST
//! implementation, and the canonical [`models::CampaignPayload`] handed to a
//! gateway by the strategy layer.

pub mod gateway;
pub mod models;
