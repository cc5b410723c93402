//! Core library for heroku-auth: API client, login flows and the netrc
//! machine-credential store.

pub mod api;
pub mod auth;
pub mod config;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthRequest, Authenticator, Credential, MachineEntry, Netrc};
pub use config::{Config, EnvHints};
