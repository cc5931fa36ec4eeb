//! Auth API Endpoints
//!
//! Registration and login plus token-holder conveniences.
//! - POST /register - Create an account
//! - POST /login - Password login, returns a bearer token
//! - GET /me - Current account info
//! - POST /refresh - New token for the current subject
//! - POST /logout - Stateless logout confirmation
//! - GET /session - Works with or without a token

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{validate_full_name, validate_username, NewAccount};
use crate::error::{AppError, Result};
use crate::repository::AccountRepository;
use crate::service::{AuthService, PasswordService};
use crate::api::accounts::AccountResponse;
use crate::api::common::{ApiResult, SuccessResponse};
use crate::api::middleware::{Authenticated, OptionalAuth};

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Unique username (4-32 characters, alphanumeric with _ and -)
    pub username: String,

    /// Password (min 8 chars with uppercase, lowercase, and a digit)
    pub password: String,

    /// Email address
    pub email: Option<String>,

    /// Display name
    pub full_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Access token
    pub access_token: String,

    /// Token type (always "bearer")
    pub token_type: String,

    /// Expiration time in seconds
    pub expires_in: i64,
}

/// Session probe response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountResponse>,
}

/// Auth service state
#[derive(Clone)]
pub struct AuthState {
    pub accounts: Arc<AccountRepository>,
    pub auth_service: Arc<AuthService>,
    pub passwords: Arc<PasswordService>,
}

fn login_response(auth_service: &AuthService, username: &str) -> Result<LoginResponse> {
    let access_token = auth_service.issue_token(username)?;
    Ok(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: auth_service.token_ttl().num_seconds(),
    })
}

/// Register a new account
///
/// Validates the username format and password policy, then creates the
/// account. Returns the created account without the password hash.
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register(
    State(state): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> std::result::Result<(StatusCode, Json<AccountResponse>), AppError> {
    validate_username(&req.username)?;
    state.passwords.policy.validate(&req.password)?;
    if let Some(ref full_name) = req.full_name {
        validate_full_name(full_name)?;
    }

    let account = state
        .accounts
        .create(NewAccount {
            username: req.username,
            password: req.password,
            email: req.email,
            full_name: req.full_name,
        })
        .await?;

    info!(username = %account.username, "new account registered");
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Login with username and password
///
/// Returns a bearer token on success. Unknown username, wrong password,
/// and deactivated account all produce the same 401.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let account = state
        .accounts
        .authenticate(&req.username, &req.password)
        .await?
        .ok_or_else(|| AppError::unauthorized("Incorrect username or password"))?;

    Ok(Json(login_response(&state.auth_service, &account.username)?))
}

/// Get current account info
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_account(Authenticated(account): Authenticated) -> ApiResult<AccountResponse> {
    Ok(Json(account.into()))
}

/// Refresh the access token
///
/// Requires a valid token; returns a fresh one with a full lifetime for
/// the same subject.
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "Token refreshed", body = LoginResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn refresh_token(
    State(state): State<AuthState>,
    Authenticated(account): Authenticated,
) -> ApiResult<LoginResponse> {
    info!(username = %account.username, "token refreshed");
    Ok(Json(login_response(&state.auth_service, &account.username)?))
}

/// Logout
///
/// Tokens are stateless, so logout happens client-side by discarding the
/// token; this endpoint confirms the token was still valid.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses((status = 200, description = "Logout confirmed", body = SuccessResponse))
)]
pub async fn logout(Authenticated(account): Authenticated) -> ApiResult<SuccessResponse> {
    info!(username = %account.username, "account logged out");
    Ok(Json(SuccessResponse::with_message(
        "Successfully logged out; discard your access token",
    )))
}

/// Probe the current session
///
/// Anonymous callers get `authenticated: false` instead of a 401.
#[utoipa::path(
    get,
    path = "/session",
    tag = "auth",
    responses((status = 200, description = "Session state", body = SessionResponse))
)]
pub async fn session(OptionalAuth(account): OptionalAuth) -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: account.is_some(),
        account: account.map(Into::into),
    })
}

/// Create the auth router
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_current_account))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/session", get(session))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_deserialization() {
        let json = r#"{"username":"john_doe","password":"SecurePass123","email":"john@example.com","fullName":"John Doe"}"#;
        let req: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.username, "john_doe");
        assert_eq!(req.full_name.as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_login_response_serialization() {
        let response = LoginResponse {
            access_token: "token123".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 1800,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("accessToken"));
        assert!(json.contains("tokenType"));
        assert!(json.contains("expiresIn"));
    }

    #[test]
    fn test_anonymous_session_serialization() {
        let response = SessionResponse {
            authenticated: false,
            account: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"authenticated":false}"#);
    }
}
