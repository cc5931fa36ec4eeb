//! Identity Resolver
//!
//! Maps a bearer token to an active account. Two entry points: `resolve`
//! for endpoints that require a caller identity, and `resolve_optional`
//! for endpoints that merely behave differently when one is present.

use std::sync::Arc;

use tracing::warn;

use crate::domain::Account;
use crate::error::{AppError, Result};
use crate::repository::AccountRepository;
use crate::service::AuthService;

pub struct IdentityResolver {
    auth: Arc<AuthService>,
    accounts: Arc<AccountRepository>,
}

impl IdentityResolver {
    pub fn new(auth: Arc<AuthService>, accounts: Arc<AccountRepository>) -> Self {
        Self { auth, accounts }
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Resolve a required identity. Invalid or expired tokens and unknown
    /// subjects are `Unauthorized`; a deactivated account is `Forbidden`.
    /// Read-only: resolution never mutates account state.
    pub async fn resolve(&self, token: &str) -> Result<Account> {
        let claims = self.auth.validate_token(token).map_err(|e| {
            warn!(token_prefix = token_prefix(token), "token validation failed: {}", e);
            AppError::unauthorized("Could not validate credentials")
        })?;

        let account = self
            .accounts
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(username = %claims.sub, "token subject has no account");
                AppError::unauthorized("Could not validate credentials")
            })?;

        if !account.is_active {
            warn!(username = %account.username, "inactive account attempted access");
            return Err(AppError::forbidden("Inactive account"));
        }

        Ok(account)
    }

    /// Resolve an optional identity: a missing, invalid, or unusable token
    /// yields `None` instead of an error.
    pub async fn resolve_optional(&self, token: Option<&str>) -> Option<Account> {
        let token = token?;
        self.resolve(token).await.ok()
    }

    /// Gate for privileged operations.
    pub fn require_superuser(&self, account: &Account) -> Result<()> {
        if !account.is_superuser {
            warn!(username = %account.username, "non-superuser attempted admin access");
            return Err(AppError::forbidden("Not enough permissions"));
        }
        Ok(())
    }
}

/// A short, safe-to-log slice of a token. Whole tokens never hit the logs.
fn token_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_prefix_truncates() {
        assert_eq!(token_prefix("eyJhbGciOiJIUzI1NiJ9"), "eyJhbGci");
        assert_eq!(token_prefix("short"), "short");
        assert_eq!(token_prefix(""), "");
    }
}
