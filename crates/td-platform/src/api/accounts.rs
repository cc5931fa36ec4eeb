//! Accounts Admin API
//!
//! REST endpoints for account management. Every endpoint here is gated on
//! the caller being an active superuser.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{validate_full_name, Account, AccountPatch};
use crate::error::AppError;
use crate::repository::AccountRepository;
use crate::service::{IdentityResolver, PasswordService};
use crate::api::common::{default_limit, default_skip, ApiResult, CountResponse, SuccessResponse};
use crate::api::middleware::Authenticated;

/// Account response DTO. Never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            full_name: account.full_name,
            is_active: account.is_active,
            is_superuser: account.is_superuser,
            created_at: account.created_at.to_rfc3339(),
            updated_at: account.updated_at.to_rfc3339(),
        }
    }
}

/// Update account request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    /// Email address
    pub email: Option<String>,

    /// Display name
    pub full_name: Option<String>,

    /// New password (re-hashed, never stored as given)
    pub password: Option<String>,

    /// Active status
    pub is_active: Option<bool>,
}

/// Query parameters for the accounts list
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AccountsQuery {
    /// Number of accounts to skip
    #[serde(default = "default_skip")]
    pub skip: u64,

    /// Maximum number of accounts to return
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Filter by active status
    pub is_active: Option<bool>,
}

/// Query parameters for the accounts count
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AccountsCountQuery {
    /// Filter by active status
    pub is_active: Option<bool>,
}

/// Accounts service state
#[derive(Clone)]
pub struct AccountsState {
    pub accounts: Arc<AccountRepository>,
    pub identity: Arc<IdentityResolver>,
    pub passwords: Arc<PasswordService>,
}

/// List accounts ordered by creation time
#[utoipa::path(
    get,
    path = "/",
    tag = "accounts",
    params(AccountsQuery),
    responses(
        (status = 200, description = "Accounts", body = Vec<AccountResponse>),
        (status = 403, description = "Not a superuser")
    )
)]
pub async fn list_accounts(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Query(query): Query<AccountsQuery>,
) -> ApiResult<Vec<AccountResponse>> {
    state.identity.require_superuser(&caller)?;

    let accounts = state
        .accounts
        .list(query.skip, query.limit, query.is_active)
        .await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// Count accounts
#[utoipa::path(
    get,
    path = "/count",
    tag = "accounts",
    params(AccountsCountQuery),
    responses((status = 200, description = "Account count", body = CountResponse))
)]
pub async fn count_accounts(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Query(query): Query<AccountsCountQuery>,
) -> ApiResult<CountResponse> {
    state.identity.require_superuser(&caller)?;

    let count = state.accounts.count(query.is_active).await?;
    Ok(Json(CountResponse { count }))
}

/// Get account by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "accounts",
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn get_account(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<AccountResponse> {
    state.identity.require_superuser(&caller)?;

    let account = state
        .accounts
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Account", &id))?;
    Ok(Json(account.into()))
}

/// Get account by username
#[utoipa::path(
    get,
    path = "/by-username/{username}",
    tag = "accounts",
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn get_account_by_username(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Path(username): Path<String>,
) -> ApiResult<AccountResponse> {
    state.identity.require_superuser(&caller)?;

    let account = state
        .accounts
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("Account", &username))?;
    Ok(Json(account.into()))
}

/// Get account by email
#[utoipa::path(
    get,
    path = "/by-email/{email}",
    tag = "accounts",
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn get_account_by_email(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Path(email): Path<String>,
) -> ApiResult<AccountResponse> {
    state.identity.require_superuser(&caller)?;

    let account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("Account", &email))?;
    Ok(Json(account.into()))
}

/// Update an account. Only supplied fields change; a password is run
/// through the policy and re-hashed.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "accounts",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_account(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<AccountResponse> {
    state.identity.require_superuser(&caller)?;

    if let Some(ref full_name) = req.full_name {
        validate_full_name(full_name)?;
    }
    if let Some(ref password) = req.password {
        state.passwords.policy.validate(password)?;
    }

    let patch = AccountPatch {
        email: req.email,
        full_name: req.full_name,
        password: req.password,
        is_active: req.is_active,
    };

    let account = state
        .accounts
        .update(&id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("Account", &id))?;
    Ok(Json(account.into()))
}

/// Delete an account (hard delete)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "accounts",
    responses(
        (status = 200, description = "Deleted", body = SuccessResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn delete_account(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<SuccessResponse> {
    state.identity.require_superuser(&caller)?;

    if !state.accounts.delete(&id).await? {
        return Err(AppError::not_found("Account", &id));
    }
    Ok(Json(SuccessResponse::ok()))
}

/// Reactivate an account
#[utoipa::path(
    post,
    path = "/{id}/activate",
    tag = "accounts",
    responses((status = 200, description = "Activated account", body = AccountResponse))
)]
pub async fn activate_account(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<AccountResponse> {
    state.identity.require_superuser(&caller)?;

    let account = state
        .accounts
        .set_active(&id, true)
        .await?
        .ok_or_else(|| AppError::not_found("Account", &id))?;
    Ok(Json(account.into()))
}

/// Deactivate an account (soft disable, preferred over delete)
#[utoipa::path(
    post,
    path = "/{id}/deactivate",
    tag = "accounts",
    responses((status = 200, description = "Deactivated account", body = AccountResponse))
)]
pub async fn deactivate_account(
    State(state): State<AccountsState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<AccountResponse> {
    state.identity.require_superuser(&caller)?;

    let account = state
        .accounts
        .set_active(&id, false)
        .await?
        .ok_or_else(|| AppError::not_found("Account", &id))?;
    Ok(Json(account.into()))
}

/// Create the accounts admin router
pub fn accounts_router(state: AccountsState) -> Router {
    Router::new()
        .route("/", get(list_accounts))
        .route("/count", get(count_accounts))
        .route("/by-username/:username", get(get_account_by_username))
        .route("/by-email/:email", get(get_account_by_email))
        .route(
            "/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/:id/activate", post(activate_account))
        .route("/:id/deactivate", post(deactivate_account))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_response_excludes_hash() {
        let account = Account::new("john_doe", "$argon2id$secret-hash")
            .with_email("john@example.com");
        let response: AccountResponse = account.into();
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("passwordHash"));
        assert!(json.contains("\"username\":\"john_doe\""));
        assert!(json.contains("isActive"));
    }

    #[test]
    fn test_update_request_deserialization() {
        let json = r#"{"fullName":"John Doe","isActive":false}"#;
        let req: UpdateAccountRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.full_name.as_deref(), Some("John Doe"));
        assert_eq!(req.is_active, Some(false));
        assert!(req.email.is_none());
        assert!(req.password.is_none());
    }
}
