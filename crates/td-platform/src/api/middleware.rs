//! API Middleware
//!
//! Authentication extractors for Axum. `Authenticated` rejects requests
//! without a usable identity; `OptionalAuth` resolves one when present
//! and otherwise carries `None`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::domain::Account;
use crate::error::AppError;
use crate::service::{extract_bearer_token, IdentityResolver};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityResolver>,
}

/// Extractor for authenticated requests: validates the bearer token and
/// resolves the active account behind it.
pub struct Authenticated(pub Account);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::unauthorized("Missing Authorization header").into_response()
            })?;

        let token = extract_bearer_token(auth_header).ok_or_else(|| {
            AppError::unauthorized("Invalid Authorization header format").into_response()
        })?;

        let app_state = parts
            .extensions
            .get::<AppState>()
            .ok_or_else(|| AppError::internal("AppState not found").into_response())?;

        let account = app_state
            .identity
            .resolve(token)
            .await
            .map_err(|e| e.into_response())?;

        Ok(Authenticated(account))
    }
}

/// Extractor for optionally authenticated requests
pub struct OptionalAuth(pub Option<Account>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token);

        let Some(app_state) = parts.extensions.get::<AppState>() else {
            return Ok(OptionalAuth(None));
        };

        Ok(OptionalAuth(app_state.identity.resolve_optional(token).await))
    }
}
