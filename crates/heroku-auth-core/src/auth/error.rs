use thiserror::Error;

use super::netrc::StoreError;
use super::prompt::PromptError;
use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Prompt(PromptError),

    /// Masked input is impossible in the non-tty shells common on Windows.
    #[error("Login is currently incompatible with git bash/Cygwin/MinGW")]
    IncompatibleShell,

    /// The API accepted the request but the body lacks the identity fields.
    #[error("Malformed response from API: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Api(ApiError),

    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("Access token cannot be empty")]
    EmptyToken,

    #[error("Organization name cannot be empty")]
    MissingOrganization,

    #[error("Invalid SSO URL: {0}")]
    InvalidSsoUrl(String),

    #[error("Failed to write status: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidResponse(detail) => AuthError::MalformedResponse(detail),
            other => AuthError::Api(other),
        }
    }
}

impl From<PromptError> for AuthError {
    fn from(err: PromptError) -> Self {
        AuthError::Prompt(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_invalid_response_becomes_malformed() {
        let err: AuthError = ApiError::InvalidResponse("expected value".to_string()).into();
        assert!(matches!(err, AuthError::MalformedResponse(ref d) if d == "expected value"));
    }

    #[test]
    fn test_rejection_stays_api_error() {
        let err: AuthError = ApiError::from_status(StatusCode::FORBIDDEN, r#"{"message":"nope"}"#).into();
        match err {
            AuthError::Api(api) => assert_eq!(api.message(), Some("nope")),
            other => panic!("expected AuthError::Api, got {other:?}"),
        }
    }

    #[test]
    fn test_mask_unsupported_message_is_verbatim() {
        let err: AuthError = PromptError::MaskUnsupported("stdin is not a tty".to_string()).into();
        assert_eq!(err.to_string(), "stdin is not a tty");
    }

    #[test]
    fn test_store_error_is_wrapped() {
        let err: AuthError = StoreError::Parse {
            line: 3,
            message: "unterminated quote".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Credential store error: Parse error on line 3: unterminated quote"
        );
    }

    #[test]
    fn test_incompatible_shell_message() {
        assert_eq!(
            AuthError::IncompatibleShell.to_string(),
            "Login is currently incompatible with git bash/Cygwin/MinGW"
        );
    }
}
