//! Authentication module for obtaining and saving platform credentials.
//!
//! This module provides:
//! - `Authenticator`: runs the password or SSO login flow and optionally
//!   saves the result
//! - `Netrc`: the machine-credential store shared with the git transport
//! - Collaborator traits (`Prompter`, `BrowserOpener`, `Platform`,
//!   `MachineStore`) so each external effect can be swapped out

pub mod authenticator;
pub mod browser;
pub mod error;
pub mod flow;
pub mod netrc;
pub mod platform;
pub mod prompt;
pub mod types;

pub use authenticator::{Authenticator, StoreLoader};
pub use browser::{BrowserError, BrowserOpener, SystemBrowser};
pub use error::AuthError;
pub use flow::{sso_init_url, Flow};
pub use netrc::{MachineStore, Netrc, StoreError};
pub use platform::{HostPlatform, Platform};
pub use prompt::{PromptError, Prompter, TerminalPrompter};
pub use types::{AuthRequest, Credential, MachineEntry, DEFAULT_EXPIRES_IN};
