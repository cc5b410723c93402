//! API client for the Heroku platform API.
//!
//! Only the two endpoints needed to establish an identity are covered:
//! creating an OAuth authorization with a username/password pair, and
//! reading the account behind a bearer token.

use std::time::Duration;

use reqwest::{header, Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the platform API
pub const DEFAULT_API_URL: &str = "https://api.heroku.com";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Media type selecting version 3 of the platform API
const ACCEPT_V3: &str = "application/vnd.heroku+json; version=3";

/// Scope requested for CLI authorizations
const GLOBAL_SCOPE: &str = "global";

#[derive(Debug, Serialize)]
struct AuthorizationRequest<'a> {
    scope: [&'a str; 1],
    expires_in: u64,
}

/// Body of a successful `POST /oauth/authorizations`.
///
/// Every field is optional so that a 2xx response with an unexpected shape
/// can be classified by the caller instead of failing inside serde.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(default)]
    pub access_token: Option<AccessToken>,
    #[serde(default)]
    pub user: Option<AuthorizedUser>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a successful `GET /account`.
#[derive(Debug, Default, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub email: Option<String>,
}

/// API client for the platform.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the production API
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_API_URL)
    }

    /// Create a client bound to an arbitrary API base URL
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.host_str().is_none() {
            return Err(ApiError::InvalidUrl(format!("{} has no host", base_url)));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_V3));

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("heroku-auth/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Host name of the API, used as the machine key when credentials are saved
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Exchange an email/password pair for an OAuth access token
    pub async fn create_authorization(
        &self,
        email: &str,
        password: &str,
        expires_in: u64,
    ) -> Result<AuthorizationResponse, ApiError> {
        let url = self.endpoint("/oauth/authorizations")?;
        debug!(%url, expires_in, "Creating OAuth authorization");

        let response = self
            .client
            .post(url)
            .basic_auth(email, Some(password))
            .json(&AuthorizationRequest {
                scope: [GLOBAL_SCOPE],
                expires_in,
            })
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Look up the account that owns a bearer token
    pub async fn fetch_account(&self, token: &str) -> Result<Account, ApiError> {
        let url = self.endpoint("/account")?;
        debug!(%url, "Fetching account");

        let response = self.client.get(url).bearer_auth(token).send().await?;

        Self::decode(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_from_base_url() {
        let client = ApiClient::new().expect("default client");
        assert_eq!(client.host(), "api.heroku.com");

        let client = ApiClient::with_base_url("http://127.0.0.1:8080").expect("local client");
        assert_eq!(client.host(), "127.0.0.1");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::with_base_url("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_join() {
        let client = ApiClient::with_base_url("https://api.heroku.com").expect("client");
        assert_eq!(
            client.endpoint("/account").expect("endpoint").as_str(),
            "https://api.heroku.com/account"
        );
    }

    #[test]
    fn test_authorization_request_body() {
        let body = serde_json::to_value(AuthorizationRequest {
            scope: [GLOBAL_SCOPE],
            expires_in: 60,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({"scope": ["global"], "expires_in": 60}));
    }

    #[test]
    fn test_parse_authorization_response_missing_token() {
        let resp: AuthorizationResponse = serde_json::from_str("{}").expect("parse empty body");
        assert!(resp.access_token.is_none());
        assert!(resp.user.is_none());

        let resp: AuthorizationResponse = serde_json::from_str(
            r#"{"access_token":{"token":"abc","expires_in":60},"user":{"email":"foo@bar.com"}}"#,
        )
        .expect("parse full body");
        let token = resp.access_token.expect("access token");
        assert_eq!(token.token.as_deref(), Some("abc"));
        assert_eq!(token.expires_in, Some(60));
        assert_eq!(resp.user.and_then(|u| u.email).as_deref(), Some("foo@bar.com"));
    }
}
