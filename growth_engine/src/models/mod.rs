//! Diesel models mapping to the database schema, plus the validated
//! in-memory views the engine computes from them.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::merchants`] — root aggregate with profile metrics
//! - [`crate::schema::analysis_results`] — one current result per (merchant, kind)
//! - [`crate::schema::peer_benchmarks`] — read-only peer aggregate statistics
//! - [`crate::schema::strategies`] — generated recommendations with a lifecycle
//! - [`crate::schema::feedback_events`] — append-only human feedback
//!
//! See the migrations for constraints and triggers (e.g., `updated_at`
//! triggers and `ON DELETE CASCADE` FKs).

pub mod analysis;
pub mod feedback;
pub mod merchant;
pub mod peer;
pub mod strategy;
