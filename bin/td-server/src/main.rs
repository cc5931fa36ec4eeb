//! TaskDeck API Server
//!
//! Production server for the TaskDeck REST APIs:
//! - Auth API: register, login, me, refresh, logout, session
//! - Accounts Admin API: list, lookup, update, delete, activate/deactivate
//! - Todos API: CRUD, search, count, by-username listings
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TD_API_PORT` | `8080` | HTTP API port |
//! | `TD_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `TD_MONGO_DB` | `taskdeck` | MongoDB database name |
//! | `TD_JWT_SECRET` | dev fallback | HMAC signing secret for access tokens |
//! | `TD_JWT_ISSUER` | `taskdeck` | JWT issuer claim |
//! | `TD_TOKEN_TTL_MINUTES` | `30` | Access token lifetime |
//! | `TD_DEV_MODE` | `false` | Seed a dev superuser account |
//! | `TD_DEV_ADMIN_PASSWORD` | `AdminPass123` | Password for the seeded account |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use axum::{response::Json, routing::get, Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tokio::{net::TcpListener, signal};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use td_platform::api::{
    accounts_router, auth_router, todos_router, AccountsState, ApiDoc, AppState, AuthState,
    TodosState,
};
use td_platform::domain::NewAccount;
use td_platform::repository::{ensure_indexes, AccountRepository, TodoRepository};
use td_platform::service::{AuthConfig, AuthService, IdentityResolver, PasswordService};

const DEV_JWT_SECRET: &str = "dev-secret-change-in-production";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting TaskDeck API Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("TD_API_PORT", 8080);
    let mongo_url = env_or("TD_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("TD_MONGO_DB", "taskdeck");
    let jwt_issuer = env_or("TD_JWT_ISSUER", "taskdeck");
    let token_ttl_minutes: i64 = env_or_parse("TD_TOKEN_TTL_MINUTES", 30);

    let jwt_secret = match std::env::var("TD_JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            warn!("TD_JWT_SECRET not set, using the development fallback secret");
            DEV_JWT_SECRET.to_string()
        }
    };

    // Connect to MongoDB with bounded timeouts so a stalled store cannot
    // hang callers indefinitely
    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mut client_options = mongodb::options::ClientOptions::parse(&mongo_url).await?;
    client_options.server_selection_timeout = Some(Duration::from_secs(5));
    client_options.connect_timeout = Some(Duration::from_secs(10));
    let mongo_client = mongodb::Client::with_options(client_options)?;
    let db = mongo_client.database(&mongo_db);
    db.run_command(mongodb::bson::doc! { "ping": 1 }).await?;
    info!("MongoDB connection established");

    ensure_indexes(&db).await?;

    // Initialize services and repositories
    let password_service = Arc::new(PasswordService::default());
    let account_repo = Arc::new(AccountRepository::new(&db, password_service.clone()));
    let todo_repo = Arc::new(TodoRepository::new(&db));

    let auth_config =
        AuthConfig::new(jwt_secret, jwt_issuer).with_ttl_minutes(token_ttl_minutes);
    let auth_service = Arc::new(AuthService::new(auth_config));
    let identity = Arc::new(IdentityResolver::new(
        auth_service.clone(),
        account_repo.clone(),
    ));
    info!("Repositories and services initialized");

    // Seed development data if in dev mode
    let dev_mode = std::env::var("TD_DEV_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    if dev_mode {
        if let Err(e) = seed_dev_superuser(&account_repo).await {
            warn!("Dev data seeding skipped: {}", e);
        }
    }

    // Shared auth state for the extractors
    let app_state = AppState {
        identity: identity.clone(),
    };

    // Build per-router states
    let auth_state = AuthState {
        accounts: account_repo.clone(),
        auth_service: auth_service.clone(),
        passwords: password_service.clone(),
    };
    let accounts_state = AccountsState {
        accounts: account_repo.clone(),
        identity: identity.clone(),
        passwords: password_service.clone(),
    };
    let todos_state = TodosState {
        todos: todo_repo,
    };

    // Build API router
    let app = Router::new()
        .nest("/api/v1/auth", auth_router(auth_state))
        .nest("/api/v1/accounts", accounts_router(accounts_state))
        .nest("/api/v1/todos", todos_router(todos_state))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("TaskDeck API Server shutdown complete");
    Ok(())
}

/// Create an "admin" superuser when it does not exist yet. Dev mode only.
async fn seed_dev_superuser(accounts: &AccountRepository) -> td_platform::error::Result<()> {
    if accounts.find_by_username("admin").await?.is_some() {
        return Ok(());
    }

    let password = env_or("TD_DEV_ADMIN_PASSWORD", "AdminPass123");
    let created = accounts
        .create(NewAccount {
            username: "admin".to_string(),
            password,
            email: None,
            full_name: Some("Development Admin".to_string()),
        })
        .await?;
    accounts.promote_to_superuser(&created.id).await?;

    info!("seeded dev superuser account 'admin'");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
