//! Common API types and utilities

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;

/// Handler result: a JSON body or a mapped platform error
pub type ApiResult<T> = std::result::Result<Json<T>, AppError>;

/// Standard API error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Success response with optional message
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Count response
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

pub(crate) fn default_skip() -> u64 {
    0
}

pub(crate) fn default_limit() -> i64 {
    100
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Unauthorized { .. }
            | AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Duplicate { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        // Internal causes are logged, not leaked.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ApiError {
            error: code.to_string(),
            message,
            details: None,
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (AppError::validation("bad input"), StatusCode::BAD_REQUEST),
            (AppError::unauthorized("no token"), StatusCode::UNAUTHORIZED),
            (AppError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AppError::forbidden("nope"), StatusCode::FORBIDDEN),
            (AppError::not_found("Todo", "X123"), StatusCode::NOT_FOUND),
            (
                AppError::duplicate("Account", "username", "john"),
                StatusCode::CONFLICT,
            ),
            (AppError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = AppError::unauthorized("no token").into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_internal_error_body_is_generic() {
        let body = ApiError {
            error: "INTERNAL_ERROR".to_string(),
            message: "Internal server error".to_string(),
            details: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("details"));
    }
}
