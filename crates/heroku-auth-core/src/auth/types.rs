use std::num::NonZeroU64;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EnvHints;

/// Default token lifetime requested from the API: one year, in seconds.
pub const DEFAULT_EXPIRES_IN: u64 = 31_536_000;

/// Options for a single login call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Use the browser-delegated SSO flow instead of email/password.
    pub sso: bool,
    /// Requested token lifetime in seconds (password flow only).
    pub expires_in: NonZeroU64,
    /// Write the resulting credential to the machine store.
    pub save: bool,
    pub hints: EnvHints,
}

impl Default for AuthRequest {
    fn default() -> Self {
        Self {
            sso: false,
            expires_in: NonZeroU64::new(DEFAULT_EXPIRES_IN).unwrap_or(NonZeroU64::MIN),
            save: false,
            hints: EnvHints::default(),
        }
    }
}

impl AuthRequest {
    pub fn sso() -> Self {
        Self {
            sso: true,
            ..Self::default()
        }
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    pub fn with_expires_in(mut self, expires_in: NonZeroU64) -> Self {
        self.expires_in = expires_in;
        self
    }

    pub fn with_hints(mut self, hints: EnvHints) -> Self {
        self.hints = hints;
        self
    }
}

/// A resolved bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub email: String,
    /// Lifetime echoed back by the API, if it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl Credential {
    /// Absolute expiry, counting from when the token was issued
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expires_in?).ok()?;
        issued_at.checked_add_signed(Duration::try_seconds(secs)?)
    }
}

/// One host entry in the machine-credential store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MachineEntry {
    pub login: String,
    pub password: String,
}

impl From<&Credential> for MachineEntry {
    fn from(credential: &Credential) -> Self {
        Self {
            login: credential.email.clone(),
            password: credential.token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_request() {
        let request = AuthRequest::default();
        assert!(!request.sso);
        assert!(!request.save);
        assert_eq!(request.expires_in.get(), 31_536_000);
    }

    #[test]
    fn test_credential_serialization_omits_missing_expiry() {
        let credential = Credential {
            token: "token".to_string(),
            email: "foo@bar.com".to_string(),
            expires_in: None,
        };
        let json = serde_json::to_value(&credential).expect("serialize");
        assert_eq!(json, serde_json::json!({"token": "token", "email": "foo@bar.com"}));
    }

    #[test]
    fn test_expires_at() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut credential = Credential {
            token: "t".to_string(),
            email: "e".to_string(),
            expires_in: Some(60),
        };
        assert_eq!(
            credential.expires_at(issued),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap())
        );

        credential.expires_in = None;
        assert_eq!(credential.expires_at(issued), None);
    }

    #[test]
    fn test_machine_entry_from_credential() {
        let credential = Credential {
            token: "token".to_string(),
            email: "foo@bar.com".to_string(),
            expires_in: Some(60),
        };
        let entry = MachineEntry::from(&credential);
        assert_eq!(entry.login, "foo@bar.com");
        assert_eq!(entry.password, "token");
    }
}
