//! TaskDeck Platform
//!
//! Core platform providing:
//! - Account management with username/password credentials
//! - Stateless JWT access tokens
//! - Request-scoped identity resolution
//! - Per-user todo management (filtering, search, partial updates)

pub mod domain;
pub mod repository;
pub mod service;
pub mod api;
pub mod error;
pub mod tsid;

pub use domain::*;
pub use error::AppError;
pub use tsid::TsidGenerator;
