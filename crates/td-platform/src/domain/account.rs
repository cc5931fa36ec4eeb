//! Account Entity
//!
//! A registered user of the system. The password is stored only as an
//! argon2id hash; the plain text never survives past the registration or
//! login boundary.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::error::{AppError, Result};

pub const USERNAME_MIN_LEN: usize = 4;
pub const USERNAME_MAX_LEN: usize = 32;
pub const FULL_NAME_MAX_LEN: usize = 100;

/// Account entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique username, 4-32 chars, letters/digits/underscore/hyphen
    pub username: String,

    /// Argon2id PHC hash string, never exposed through the API
    pub password_hash: String,

    /// Email address (unique when present)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Inactive accounts cannot authenticate or use their tokens
    pub is_active: bool,

    /// Grants access to the account admin API
    pub is_superuser: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            username: username.into(),
            password_hash: password_hash.into(),
            email: None,
            full_name: None,
            is_active: true,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.updated_at = Utc::now();
    }
}

/// Fields for creating an account. The password arrives in plain text and
/// is hashed by the repository before anything is persisted.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl NewAccount {
    /// Validate everything except the password policy, which is the
    /// credential store's concern.
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        if let Some(ref name) = self.full_name {
            validate_full_name(name)?;
        }
        Ok(())
    }
}

/// Partial account update. Only fields that are present change; a
/// `password` value is re-hashed by the repository rather than stored.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.full_name.is_none()
            && self.password.is_none()
            && self.is_active.is_none()
    }
}

pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AppError::validation(format!(
            "username: must be {} to {} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::validation(
            "username: only letters, digits, underscores, and hyphens are allowed",
        ));
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<()> {
    if full_name.chars().count() > FULL_NAME_MAX_LEN {
        return Err(AppError::validation(format!(
            "fullName: must be at most {} characters",
            FULL_NAME_MAX_LEN
        )));
    }
    Ok(())
}
