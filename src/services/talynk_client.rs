//! Talynk API client.
//!
//! Provides the HTTP client for the Talynk backend with bearer-token
//! authentication. The session token is held in memory only; it is set by
//! a successful login and dropped on logout.

use crate::error::AppError;
use crate::models::{
    ApproverDashboardStats, AuthSession, AuthUser, LoginCredentials, Post, PostId,
    SignupCredentials,
};
use crate::services::api::{AuthApi, ReviewApi};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Talynk API client configuration.
#[derive(Debug, Clone)]
pub struct TalynkClientConfig {
    /// Base URL of the backend (e.g., `http://localhost:3000`).
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TalynkClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Talynk API client.
///
/// Cloning is cheap and clones share the session token.
#[derive(Debug, Clone)]
pub struct TalynkClient {
    client: Client,
    config: TalynkClientConfig,
    token: Arc<RwLock<Option<String>>>,
}

/// Success envelope used by the auth endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct RejectBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl TalynkClient {
    /// Create a new client with no active session.
    pub fn new(config: TalynkClientConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Whether a session token is currently held.
    pub fn has_session(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Install a session token obtained elsewhere (e.g. restored by the host).
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    fn bearer(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().ok().and_then(|t| t.clone());
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn post_path_endpoint(id: &PostId, action: &str) -> String {
        format!(
            "/approver/posts/{}/{}",
            urlencoding::encode(id.as_str()),
            action
        )
    }

    /// Extract a human-readable message from an error body.
    fn error_message(body: &str) -> Option<String> {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                // Talynk returns errors as {"message": "..."} or {"error": "..."}
                v.get("message")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str().map(str::to_string))
            })
            .filter(|m| !m.trim().is_empty())
    }

    /// Turn a non-success response into an error.
    async fn error_from(response: Response, endpoint: &str) -> AppError {
        let status = response.status();
        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let body_message = Self::error_message(&body);

        if status == StatusCode::UNAUTHORIZED {
            return match body_message {
                Some(msg) => AppError::api_full(msg, status_code, endpoint),
                None => AppError::authentication_expired(
                    "Your session has expired. Please log in again.",
                ),
            };
        }

        let message = match (status, body_message) {
            (_, Some(msg)) => msg,
            (StatusCode::FORBIDDEN, None) => "Access denied".to_string(),
            (StatusCode::NOT_FOUND, None) => "Resource not found".to_string(),
            (StatusCode::TOO_MANY_REQUESTS, None) => "Rate limit exceeded".to_string(),
            (_, None) => format!("Request failed ({}): {}", status_code, body),
        };
        AppError::api_full(message, status_code, endpoint)
    }

    /// Handle API response errors and decode the body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response, endpoint).await);
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<T>(&body).map_err(|e| {
            AppError::malformed(format!("Unexpected response shape: {}", e), endpoint)
        })
    }

    /// Like `handle_response`, but for `{status, data}` envelopes.
    async fn handle_envelope<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let envelope: Envelope<T> = self.handle_response(response, endpoint).await?;
        if envelope.status.as_deref().is_some_and(|s| s != "success") {
            return Err(AppError::api(
                envelope
                    .message
                    .unwrap_or_else(|| "Request was not successful".to_string()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| AppError::malformed("Response has no data", endpoint))
    }

    /// Check a response that carries no meaningful body.
    async fn expect_success(&self, response: Response, endpoint: &str) -> Result<(), AppError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response, endpoint).await)
        }
    }
}

impl ReviewApi for TalynkClient {
    async fn fetch_pending_posts(&self) -> Result<Vec<Post>, AppError> {
        let endpoint = "/approver/posts/pending";
        let request = self.bearer(self.client.get(self.api_url(endpoint)));
        let response = request.send().await?;
        self.handle_response(response, endpoint).await
    }

    async fn fetch_approver_stats(&self) -> Result<ApproverDashboardStats, AppError> {
        let endpoint = "/approver/stats";
        let request = self.bearer(self.client.get(self.api_url(endpoint)));
        let response = request.send().await?;
        self.handle_response(response, endpoint).await
    }

    async fn approve_post(&self, id: &PostId) -> Result<(), AppError> {
        let endpoint = Self::post_path_endpoint(id, "approve");
        let request = self.bearer(self.client.put(self.api_url(&endpoint)));
        let response = request.send().await?;
        self.expect_success(response, &endpoint).await
    }

    async fn reject_post(&self, id: &PostId, reason: Option<&str>) -> Result<(), AppError> {
        let endpoint = Self::post_path_endpoint(id, "reject");
        let request = self
            .bearer(self.client.put(self.api_url(&endpoint)))
            .json(&RejectBody { reason });
        let response = request.send().await?;
        self.expect_success(response, &endpoint).await
    }
}

impl AuthApi for TalynkClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, AppError> {
        let endpoint = "/auth/login";
        let response = self
            .client
            .post(self.api_url(endpoint))
            .json(credentials)
            .send()
            .await?;

        // Bad credentials come back as 401 with a message; that is a login
        // failure, not an expired session.
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST
        ) {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::authentication(
                Self::error_message(&body).unwrap_or_else(|| "Invalid credentials".to_string()),
            ));
        }

        let session: AuthSession = self.handle_envelope(response, endpoint).await?;
        self.set_token(Some(session.access_token.clone()));
        log::info!("[api] Logged in as {} ({})", session.user.username, session.user.role);
        Ok(session)
    }

    async fn register(&self, signup: &SignupCredentials) -> Result<AuthUser, AppError> {
        let endpoint = "/auth/register";
        let response = self
            .client
            .post(self.api_url(endpoint))
            .json(signup)
            .send()
            .await?;
        self.handle_envelope(response, endpoint).await
    }

    async fn logout(&self) -> Result<(), AppError> {
        let endpoint = "/auth/logout";
        let request = self.bearer(self.client.post(self.api_url(endpoint)));
        // Forget the token before the network call so a failed logout still
        // leaves no usable session behind.
        self.set_token(None);
        let response = request.send().await?;
        self.expect_success(response, endpoint).await
    }

    async fn fetch_profile(&self) -> Result<AuthUser, AppError> {
        let endpoint = "/auth/profile";
        let request = self.bearer(self.client.get(self.api_url(endpoint)));
        let response = request.send().await?;
        self.handle_envelope(response, endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> TalynkClient {
        TalynkClient::new(TalynkClientConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_api_url_construction() {
        let c = client("http://localhost:3000/");
        assert_eq!(
            c.api_url("/approver/stats"),
            "http://localhost:3000/api/approver/stats"
        );
    }

    #[test]
    fn test_post_endpoint_encodes_id() {
        let id = PostId::new("a b/c");
        assert_eq!(
            TalynkClient::post_path_endpoint(&id, "approve"),
            "/approver/posts/a%20b%2Fc/approve"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            TalynkClient::error_message(r#"{"message":"Post already reviewed"}"#),
            Some("Post already reviewed".to_string())
        );
        assert_eq!(
            TalynkClient::error_message(r#"{"error":"bad"}"#),
            Some("bad".to_string())
        );
        assert_eq!(TalynkClient::error_message(r#"{"message":""}"#), None);
        assert_eq!(TalynkClient::error_message("<html>"), None);
    }

    #[test]
    fn test_token_is_shared_between_clones() {
        let a = client("http://localhost:3000");
        let b = a.clone();
        assert!(!b.has_session());
        a.set_token(Some("t".to_string()));
        assert!(b.has_session());
        b.set_token(None);
        assert!(!a.has_session());
    }

    #[test]
    fn test_reject_body_skips_missing_reason() {
        let json = serde_json::to_string(&RejectBody { reason: None }).unwrap();
        assert_eq!(json, "{}");
        let json = serde_json::to_string(&RejectBody { reason: Some("blurry") }).unwrap();
        assert_eq!(json, r#"{"reason":"blurry"}"#);
    }
}
