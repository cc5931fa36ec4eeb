//! Todos API
//!
//! REST endpoints for todo management. All endpoints require an
//! authenticated caller; a created todo defaults to the caller as owner.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Label, NewTodo, Priority, Todo, TodoPatch};
use crate::error::AppError;
use crate::repository::TodoRepository;
use crate::api::common::{default_limit, default_skip, ApiResult, CountResponse};
use crate::api::middleware::Authenticated;

/// Create todo request. Priority and labels are plain strings so an
/// unknown value reports the offending field instead of failing to parse.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    /// Title, 1-100 characters
    pub title: String,

    /// Description, up to 500 characters
    pub description: Option<String>,

    /// Completion status
    #[serde(default)]
    pub completed: bool,

    /// Priority: high, medium, or low (default medium)
    pub priority: Option<String>,

    /// Due date (today or later)
    pub deadline: NaiveDate,

    /// Labels from the fixed vocabulary: Work, Personal, Urgent
    #[serde(default)]
    pub labels: Vec<String>,

    /// Owning username; defaults to the caller
    pub username: Option<String>,
}

/// Update todo request; only supplied fields change
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub labels: Option<Vec<String>>,
}

impl From<UpdateTodoRequest> for TodoPatch {
    fn from(req: UpdateTodoRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            completed: req.completed,
            priority: req.priority,
            deadline: req.deadline,
            labels: req.labels,
        }
    }
}

/// Todo response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub deadline: NaiveDate,
    pub labels: Vec<Label>,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            priority: todo.priority,
            deadline: todo.deadline,
            labels: todo.labels,
            username: todo.username,
            created_at: todo.created_at.to_rfc3339(),
            updated_at: todo.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the todos list
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TodosQuery {
    /// Number of items to skip
    #[serde(default = "default_skip")]
    pub skip: u64,

    /// Maximum number of items to return
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Filter by completion status
    pub completed: Option<bool>,

    /// Filter by priority
    pub priority: Option<String>,
}

/// Query parameters for search
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Search query; `*` is a multi-character wildcard
    pub q: String,

    #[serde(default = "default_skip")]
    pub skip: u64,

    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Query parameters for the todos count
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TodosCountQuery {
    /// Filter by completion status
    pub completed: Option<bool>,
}

/// Query parameters for the by-username list
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TodosByUsernameQuery {
    #[serde(default = "default_skip")]
    pub skip: u64,

    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Filter by completion status
    pub completed: Option<bool>,
}

/// Todos service state
#[derive(Clone)]
pub struct TodosState {
    pub todos: Arc<TodoRepository>,
}

fn parse_priority_filter(raw: Option<&str>) -> Result<Option<Priority>, AppError> {
    match raw {
        None => Ok(None),
        Some(raw) => Priority::parse(raw).map(Some).ok_or_else(|| {
            AppError::validation(format!(
                "priority: must be one of high, medium, low (got '{}')",
                raw
            ))
        }),
    }
}

/// Create a todo
#[utoipa::path(
    post,
    path = "/",
    tag = "todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_todo(
    State(state): State<TodosState>,
    Authenticated(caller): Authenticated,
    Json(req): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), AppError> {
    let todo = state
        .todos
        .create(NewTodo {
            title: req.title,
            description: req.description,
            completed: req.completed,
            priority: req.priority,
            deadline: req.deadline,
            labels: req.labels,
            username: req.username.unwrap_or(caller.username),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(todo.into())))
}

/// List todos with optional filters, ordered by deadline
#[utoipa::path(
    get,
    path = "/",
    tag = "todos",
    params(TodosQuery),
    responses((status = 200, description = "Todos", body = Vec<TodoResponse>))
)]
pub async fn list_todos(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Query(query): Query<TodosQuery>,
) -> ApiResult<Vec<TodoResponse>> {
    let priority = parse_priority_filter(query.priority.as_deref())?;
    let todos = state
        .todos
        .list(query.skip, query.limit, query.completed, priority)
        .await?;
    Ok(Json(todos.into_iter().map(Into::into).collect()))
}

/// Search todos by title and description
#[utoipa::path(
    get,
    path = "/search",
    tag = "todos",
    params(SearchQuery),
    responses((status = 200, description = "Matching todos", body = Vec<TodoResponse>))
)]
pub async fn search_todos(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<TodoResponse>> {
    if query.q.is_empty() {
        return Err(AppError::validation("q: must not be empty"));
    }
    let todos = state.todos.search(&query.q, query.skip, query.limit).await?;
    Ok(Json(todos.into_iter().map(Into::into).collect()))
}

/// Count todos
#[utoipa::path(
    get,
    path = "/count",
    tag = "todos",
    params(TodosCountQuery),
    responses((status = 200, description = "Todo count", body = CountResponse))
)]
pub async fn count_todos(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Query(query): Query<TodosCountQuery>,
) -> ApiResult<CountResponse> {
    let count = state.todos.count(query.completed).await?;
    Ok(Json(CountResponse { count }))
}

/// List todos owned by a username
#[utoipa::path(
    get,
    path = "/by-username/{username}",
    tag = "todos",
    params(TodosByUsernameQuery),
    responses((status = 200, description = "Todos", body = Vec<TodoResponse>))
)]
pub async fn list_todos_by_username(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Path(username): Path<String>,
    Query(query): Query<TodosByUsernameQuery>,
) -> ApiResult<Vec<TodoResponse>> {
    let todos = state
        .todos
        .list_by_username(&username, query.skip, query.limit, query.completed)
        .await?;
    Ok(Json(todos.into_iter().map(Into::into).collect()))
}

/// Get a todo by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "todos",
    responses(
        (status = 200, description = "Todo", body = TodoResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn get_todo(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<TodoResponse> {
    let todo = state
        .todos
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Todo", &id))?;
    Ok(Json(todo.into()))
}

/// Update a todo (partial)
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "todos",
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Updated todo", body = TodoResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn update_todo(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateTodoRequest>,
) -> ApiResult<TodoResponse> {
    let todo = state
        .todos
        .update(&id, req.into())
        .await?
        .ok_or_else(|| AppError::not_found("Todo", &id))?;
    Ok(Json(todo.into()))
}

/// Delete a todo
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "todos",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn delete_todo(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.todos.delete(&id).await? {
        return Err(AppError::not_found("Todo", &id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a todo as completed
#[utoipa::path(
    patch,
    path = "/{id}/complete",
    tag = "todos",
    responses((status = 200, description = "Updated todo", body = TodoResponse))
)]
pub async fn complete_todo(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<TodoResponse> {
    set_completed(&state, &id, true).await
}

/// Mark a todo as not completed
#[utoipa::path(
    patch,
    path = "/{id}/incomplete",
    tag = "todos",
    responses((status = 200, description = "Updated todo", body = TodoResponse))
)]
pub async fn incomplete_todo(
    State(state): State<TodosState>,
    Authenticated(_caller): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<TodoResponse> {
    set_completed(&state, &id, false).await
}

async fn set_completed(state: &TodosState, id: &str, completed: bool) -> ApiResult<TodoResponse> {
    let patch = TodoPatch {
        completed: Some(completed),
        ..Default::default()
    };
    let todo = state
        .todos
        .update(id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("Todo", id))?;
    Ok(Json(todo.into()))
}

/// Create the todos router
pub fn todos_router(state: TodosState) -> Router {
    Router::new()
        .route("/", post(create_todo).get(list_todos))
        .route("/search", get(search_todos))
        .route("/count", get(count_todos))
        .route("/by-username/:username", get(list_todos_by_username))
        .route(
            "/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/:id/complete", patch(complete_todo))
        .route("/:id/incomplete", patch(incomplete_todo))
        .with_state(state)
}
