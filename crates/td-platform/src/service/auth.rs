//! Auth Service
//!
//! Issues and validates stateless HS256 access tokens. The signing secret
//! is process-wide configuration loaded once at startup; validation never
//! consults external state, so a token can only expire, never be revoked.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC signing secret shared by the whole process
    pub secret_key: String,
    /// Issuer claim stamped into and required of every token
    pub issuer: String,
    /// Default access token lifetime
    pub access_token_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn new(secret_key: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            issuer: issuer.into(),
            access_token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        }
    }

    pub fn with_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_token_ttl_minutes = minutes;
        self
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: the account's username
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);
        validation.leeway = 0;
        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::minutes(self.config.access_token_ttl_minutes)
    }

    /// Issue a token for `subject` with the configured lifetime.
    pub fn issue_token(&self, subject: &str) -> Result<String> {
        self.issue_token_with_ttl(subject, self.token_ttl())
    }

    /// Issue a token for `subject` expiring `ttl` from now.
    pub fn issue_token_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("token encoding failed: {}", e)))
    }

    /// Validate a token and return its claims. Expired tokens fail with
    /// `TokenExpired`; any signature or decoding failure is `InvalidToken`.
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        match decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AppError::TokenExpired),
                _ => Err(AppError::InvalidToken {
                    message: "signature or claims verification failed".to_string(),
                }),
            },
        }
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new("test-secret-key", "taskdeck"))
    }

    #[test]
    fn test_issue_and_validate() {
        let auth = service();
        let token = auth.issue_token("john_doe").unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "john_doe");
        assert_eq!(claims.iss, "taskdeck");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_fails() {
        let auth = service();
        let token = auth
            .issue_token_with_ttl("john_doe", Duration::seconds(-5))
            .unwrap();
        match auth.validate_token(&token) {
            Err(AppError::TokenExpired) => {}
            other => panic!("expected TokenExpired, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_tampered_token_fails() {
        let auth = service();
        let mut token = auth.issue_token("john_doe").unwrap();
        token.push('x');
        assert!(matches!(
            auth.validate_token(&token),
            Err(AppError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let issuing = service();
        let validating = AuthService::new(AuthConfig::new("other-secret", "taskdeck"));
        let token = issuing.issue_token("john_doe").unwrap();
        assert!(validating.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_fails() {
        let issuing = AuthService::new(AuthConfig::new("test-secret-key", "someone-else"));
        let validating = service();
        let token = issuing.issue_token("john_doe").unwrap();
        assert!(validating.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_fails() {
        let auth = service();
        assert!(auth.validate_token("not.a.jwt").is_err());
        assert!(auth.validate_token("").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }
}
