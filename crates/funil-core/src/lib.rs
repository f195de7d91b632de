//! Core library for the Funil Digital admin console.
//!
//! - `api`: REST client for the funnel backend (`ApiClient`, `ApiError`)
//! - `auth`: session lifecycle and persisted token storage
//! - `models`: data-transfer types for every backend resource
//! - `config`: on-disk configuration with environment overrides
//! - `utils`: display formatting helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthBackend, AuthError, Session, TokenStore};
pub use config::Config;
