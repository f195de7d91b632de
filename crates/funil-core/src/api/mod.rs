//! REST API client module for the Funil Digital backend.
//!
//! This module provides the `ApiClient` used by every view to talk to the
//! backend under its `/api` base path.
//!
//! The API uses JWT bearer token authentication obtained through
//! `POST /auth/login`.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
