//! Login, signup and logout flows.
//!
//! Each submission is a single attempt; there is no automatic retry. The
//! host disables its form while [`LoginFlow::is_pending`] is true and shows
//! the `Failed` message inline.

use crate::error::AppError;
use crate::models::{AuthUser, LoginCredentials, SignupCredentials};
use crate::services::api::AuthApi;
use crate::services::navigation::resolve_redirect;
use crate::services::query_cache::{QueryCache, PROFILE_KEY};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Fallback text when the backend gives no usable error message.
pub const DEFAULT_LOGIN_ERROR: &str = "An error occurred during login.";

/// State of the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoginState {
    #[default]
    Idle,
    Submitting,
    Failed {
        message: String,
    },
    Succeeded {
        destination: String,
    },
}

/// Result of one login submission.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Navigate to `destination`, replacing the login page in history.
    Redirect { destination: String, user: AuthUser },
    /// Stay on the form and show `message`.
    Failed { message: String },
    /// A submission is already in flight; nothing was sent.
    AlreadySubmitting,
}

/// Login mutation.
pub struct LoginFlow<A> {
    api: Arc<A>,
    cache: Arc<QueryCache>,
    state: Mutex<LoginState>,
}

impl<A: AuthApi> LoginFlow<A> {
    pub fn new(api: Arc<A>, cache: Arc<QueryCache>) -> Self {
        Self {
            api,
            cache,
            state: Mutex::new(LoginState::Idle),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LoginState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> LoginState {
        self.lock_state().clone()
    }

    /// Whether a submission is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(*self.lock_state(), LoginState::Submitting)
    }

    /// Submit credentials.
    ///
    /// `referrer` is the path captured from the navigation that led to the
    /// login page.
    pub async fn submit(&self, credentials: LoginCredentials, referrer: Option<&str>) -> LoginOutcome {
        {
            let mut state = self.lock_state();
            if *state == LoginState::Submitting {
                log::debug!("[auth] Ignoring login submit while one is in flight");
                return LoginOutcome::AlreadySubmitting;
            }
            *state = LoginState::Submitting;
        }
        let _in_flight = SubmitGuard { state: &self.state };

        if let Err(e) = validate_login(&credentials) {
            return self.fail(e);
        }

        log::info!("[auth] Signing in {} as {}", credentials.email, credentials.role);
        match self.api.login(&credentials).await {
            Ok(session) => {
                self.cache.invalidate(PROFILE_KEY);
                let destination = resolve_redirect(session.user.role, referrer);
                log::info!("[auth] Login succeeded, redirecting to {}", destination);
                *self.lock_state() = LoginState::Succeeded {
                    destination: destination.clone(),
                };
                LoginOutcome::Redirect {
                    destination,
                    user: session.user,
                }
            }
            Err(e) => {
                log::warn!("[auth] Login failed: {}", e);
                self.fail(e)
            }
        }
    }

    fn fail(&self, error: AppError) -> LoginOutcome {
        let message = match error.user_message().trim() {
            "" => DEFAULT_LOGIN_ERROR.to_string(),
            msg => msg.to_string(),
        };
        *self.lock_state() = LoginState::Failed {
            message: message.clone(),
        };
        LoginOutcome::Failed { message }
    }

    /// Return the form to its idle state, e.g. when the user edits a field.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        if *state != LoginState::Submitting {
            *state = LoginState::Idle;
        }
    }
}

/// Puts a submission that never finished back to `Idle`.
///
/// If the `submit` future is dropped mid-request, the state would otherwise
/// stay `Submitting` and lock the form.
struct SubmitGuard<'a> {
    state: &'a Mutex<LoginState>,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state == LoginState::Submitting {
            log::debug!("[auth] Login submit abandoned before completing");
            *state = LoginState::Idle;
        }
    }
}

fn validate_login(credentials: &LoginCredentials) -> Result<(), AppError> {
    if !credentials.email.contains('@') {
        return Err(AppError::invalid_input_field(
            "Please enter a valid email address",
            "email",
        ));
    }
    if credentials.password.is_empty() {
        return Err(AppError::invalid_input_field("Password is required", "password"));
    }
    Ok(())
}

/// Account registration.
pub struct SignupFlow<A> {
    api: Arc<A>,
}

impl<A: AuthApi> SignupFlow<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn submit(&self, signup: SignupCredentials) -> Result<AuthUser, AppError> {
        if signup.username.trim().is_empty() {
            return Err(AppError::invalid_input_field("Username is required", "username"));
        }
        if !signup.email.contains('@') {
            return Err(AppError::invalid_input_field(
                "Please enter a valid email address",
                "email",
            ));
        }
        if signup.password.is_empty() {
            return Err(AppError::invalid_input_field("Password is required", "password"));
        }

        let user = self.api.register(&signup).await?;
        log::info!("[auth] Registered {} as {}", user.username, user.role);
        Ok(user)
    }
}

/// End the session and drop every cached query.
///
/// The local session is gone even if the backend call fails.
pub async fn logout<A: AuthApi>(api: &A, cache: &QueryCache) {
    cache.clear();
    match api.logout().await {
        Ok(()) => log::info!("[auth] Logged out"),
        Err(e) => log::warn!("[auth] Server logout failed (local session cleared): {}", e),
    }
}
