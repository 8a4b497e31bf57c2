//! Talynk Review - client core for the Talynk approver portal.
//!
//! This library holds everything behind the approver dashboard except the
//! rendering: the typed Talynk API client, the review queue with periodic
//! refresh and optimistic decisions, and the login flow. A host shell reads
//! [`services::QueueState`] snapshots and reacts to
//! [`services::QueueEvent`]s.

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use app::TalynkApp;
pub use config::{AppConfig, QueueConfig};
pub use error::AppError;
