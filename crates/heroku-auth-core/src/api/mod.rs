//! REST API client module for the Heroku platform API.
//!
//! This module provides the `ApiClient` used by the login flows to
//! create OAuth authorizations and to resolve the account behind a token.

pub mod client;
pub mod error;

pub use client::{Account, ApiClient, AuthorizationResponse, DEFAULT_API_URL};
pub use error::ApiError;
