//! Application error types.
//!
//! These errors are serializable so a host shell can forward them to its
//! front-end unchanged. Every failure the review queue or login flow can
//! hit is one of these variants.

use serde::Serialize;
use thiserror::Error;

/// Message fragments that identify an authentication failure when the
/// backend reports it through a generic error body.
const AUTH_REQUIRED_MARKERS: &[&str] = &[
    "unauthorized",
    "unauthenticated",
    "token expired",
    "jwt expired",
    "invalid token",
    "log in again",
    "login again",
    "not authenticated",
];

/// Application-level errors.
///
/// All variants serialize to a structured JSON object for frontend consumption.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Talynk API returned a non-success status.
    #[error("API error: {message}")]
    Api {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response body did not have the expected shape.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Credentials were rejected.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Session token expired or missing - the user has to log in again.
    #[error("Session expired: {message}")]
    AuthenticationExpired { message: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("Config error: {message}")]
    Config { message: String },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create an API error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create an API error with status code and endpoint.
    pub fn api_full(message: impl Into<String>, status_code: u16, endpoint: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a malformed response error for an endpoint.
    pub fn malformed(message: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an authentication expired error.
    pub fn authentication_expired(message: impl Into<String>) -> Self {
        Self::AuthenticationExpired {
            message: message.into(),
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the user has to log in again before retrying.
    ///
    /// Besides the dedicated variant, API errors whose message names an
    /// authentication problem count, since the backend does not always
    /// answer those with a 401.
    pub fn is_auth_required(&self) -> bool {
        match self {
            Self::AuthenticationExpired { .. } => true,
            Self::Api {
                status_code: Some(401),
                ..
            } => true,
            Self::Api { message, .. } | Self::Network { message } => {
                let lowered = message.to_lowercase();
                AUTH_REQUIRED_MARKERS
                    .iter()
                    .any(|marker| lowered.contains(marker))
            }
            _ => false,
        }
    }

    /// The bare message without the variant prefix, for inline display.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Api { message, .. }
            | Self::Network { message }
            | Self::MalformedResponse { message, .. }
            | Self::Authentication { message }
            | Self::AuthenticationExpired { message }
            | Self::InvalidInput { message, .. }
            | Self::Config { message }
            | Self::Internal { message } => message.as_str(),
        }
    }
}

// Conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else if err.is_decode() {
            Self::MalformedResponse {
                message: err.to_string(),
                endpoint: None,
            }
        } else if err.is_status() {
            Self::api(format!("HTTP error: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse {
            message: format!("JSON error: {}", err),
            endpoint: None,
        }
    }
}
