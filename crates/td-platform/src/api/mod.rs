//! API Layer
//!
//! REST API endpoints for the platform. Thin adapters over the
//! repositories and services; routing and status mapping only.

pub mod common;
pub mod middleware;

pub mod auth;
pub mod accounts;
pub mod todos;

pub mod openapi;

pub use common::*;
pub use middleware::{AppState, Authenticated, OptionalAuth};

pub use auth::{AuthState, auth_router};
pub use accounts::{AccountsState, accounts_router};
pub use todos::{TodosState, todos_router};
pub use openapi::ApiDoc;
