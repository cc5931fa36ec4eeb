//! OpenAPI Documentation
//!
//! Central OpenAPI specification for all platform APIs.

use utoipa::OpenApi;

/// TaskDeck API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TaskDeck API",
        version = "1.0.0",
        description = "REST APIs for accounts, authentication, and todos"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Registration and authentication"),
        (name = "accounts", description = "Account administration"),
        (name = "todos", description = "Todo management")
    ),
    paths(
        // Auth API
        super::auth::register,
        super::auth::login,
        super::auth::get_current_account,
        super::auth::refresh_token,
        super::auth::logout,
        super::auth::session,
        // Accounts Admin API
        super::accounts::list_accounts,
        super::accounts::count_accounts,
        super::accounts::get_account,
        super::accounts::get_account_by_username,
        super::accounts::get_account_by_email,
        super::accounts::update_account,
        super::accounts::delete_account,
        super::accounts::activate_account,
        super::accounts::deactivate_account,
        // Todos API
        super::todos::create_todo,
        super::todos::list_todos,
        super::todos::search_todos,
        super::todos::count_todos,
        super::todos::list_todos_by_username,
        super::todos::get_todo,
        super::todos::update_todo,
        super::todos::delete_todo,
        super::todos::complete_todo,
        super::todos::incomplete_todo,
    ),
    components(
        schemas(
            // Auth schemas
            super::auth::RegisterRequest,
            super::auth::LoginRequest,
            super::auth::LoginResponse,
            super::auth::SessionResponse,
            // Account schemas
            super::accounts::AccountResponse,
            super::accounts::UpdateAccountRequest,
            // Todo schemas
            super::todos::CreateTodoRequest,
            super::todos::UpdateTodoRequest,
            super::todos::TodoResponse,
            // Common schemas
            super::common::ApiError,
            super::common::SuccessResponse,
            super::common::CountResponse,
        )
    )
)]
pub struct ApiDoc;
