//! Business logic services.
//!
//! This module contains the core logic for talking to the Talynk API,
//! keeping the review queue in sync, and signing users in.
//!
//! Services depend on the [`api`] traits rather than the concrete HTTP
//! client, so they can be exercised against fakes.

pub mod api;
pub mod auth_flow;
pub mod navigation;
pub mod query_cache;
pub mod queue_events;
pub mod review_engine;
pub mod review_queue;
pub mod talynk_client;

pub use api::{AuthApi, ReviewApi};
pub use auth_flow::{LoginFlow, LoginOutcome, LoginState, SignupFlow};
pub use query_cache::QueryCache;
pub use queue_events::{NoticeLevel, Notification, QueueEvent};
pub use review_engine::{ReviewQueueEngine, ReviewQueueHandle};
pub use review_queue::{QueueState, QueueView, RollbackPolicy};
pub use talynk_client::{TalynkClient, TalynkClientConfig};
