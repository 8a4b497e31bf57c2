//! Data models for the application.
//!
//! These models represent the entities exchanged with the Talynk API and
//! handed to the host shell for rendering.
//!
//! All models derive Serialize so a host can forward them to its front-end.

pub mod auth;
pub mod decision;
pub mod post;
pub mod stats;

// Re-exports for convenient access
pub use auth::{AuthSession, AuthUser, LoginCredentials, Role, SignupCredentials};
pub use decision::Decision;
pub use post::{Post, PostAuthor, PostCategory, PostId, PostStatus, UserId};
pub use stats::ApproverDashboardStats;
