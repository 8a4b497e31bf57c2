//! API seams used by the review queue and the login flow.
//!
//! [`TalynkClient`](crate::services::talynk_client::TalynkClient) implements
//! both traits against the real backend; tests plug in in-memory fakes.

use crate::error::AppError;
use crate::models::{
    ApproverDashboardStats, AuthSession, AuthUser, LoginCredentials, Post, PostId,
    SignupCredentials,
};
use std::future::Future;

/// Approver-side operations on the review queue.
pub trait ReviewApi: Send + Sync {
    /// Posts awaiting review, in backend order.
    fn fetch_pending_posts(&self) -> impl Future<Output = Result<Vec<Post>, AppError>> + Send;

    /// Current aggregate counts.
    fn fetch_approver_stats(
        &self,
    ) -> impl Future<Output = Result<ApproverDashboardStats, AppError>> + Send;

    fn approve_post(&self, id: &PostId) -> impl Future<Output = Result<(), AppError>> + Send;

    fn reject_post(
        &self,
        id: &PostId,
        reason: Option<&str>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Account operations.
pub trait AuthApi: Send + Sync {
    fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> impl Future<Output = Result<AuthSession, AppError>> + Send;

    fn register(
        &self,
        signup: &SignupCredentials,
    ) -> impl Future<Output = Result<AuthUser, AppError>> + Send;

    fn logout(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    fn fetch_profile(&self) -> impl Future<Output = Result<AuthUser, AppError>> + Send;
}
