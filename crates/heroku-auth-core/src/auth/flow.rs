//! Choosing between the password and SSO login flows.

use reqwest::Url;
use tracing::debug;

use super::error::AuthError;
use super::prompt::Prompter;
use super::types::AuthRequest;

pub const ORGANIZATION_PROMPT: &str = "Enter your organization name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Password,
    /// Browser-delegated login starting at `url`.
    Sso { url: String },
}

impl Flow {
    /// Decide which flow runs. For SSO this may prompt for the organization,
    /// but never touches the network or the browser.
    pub async fn select(
        request: &AuthRequest,
        prompter: &dyn Prompter,
        sso_base_url: &str,
    ) -> Result<Self, AuthError> {
        if !request.sso {
            return Ok(Flow::Password);
        }

        if let Some(ref url) = request.hints.sso_url {
            debug!(%url, "Using SSO URL override");
            return Ok(Flow::Sso { url: url.clone() });
        }

        let organization = match request.hints.organization {
            Some(ref org) => org.clone(),
            None => prompter
                .prompt(ORGANIZATION_PROMPT, false)
                .await?
                .trim()
                .to_string(),
        };
        if organization.is_empty() {
            return Err(AuthError::MissingOrganization);
        }
        debug!(%organization, "Resolved SSO organization");

        Ok(Flow::Sso {
            url: sso_init_url(sso_base_url, &organization)?,
        })
    }
}

/// `<base>/saml/<organization>/init?cli=true`, with the organization
/// percent-encoded as a single path segment.
pub fn sso_init_url(base: &str, organization: &str) -> Result<String, AuthError> {
    let mut url = Url::parse(base).map_err(|e| AuthError::InvalidSsoUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| AuthError::InvalidSsoUrl(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(["saml", organization, "init"]);
    url.set_query(Some("cli=true"));
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sso_init_url() {
        assert_eq!(
            sso_init_url("https://sso.heroku.com", "myorg").expect("url"),
            "https://sso.heroku.com/saml/myorg/init?cli=true"
        );
    }

    #[test]
    fn test_sso_init_url_trailing_slash_base() {
        assert_eq!(
            sso_init_url("https://sso.heroku.com/", "myorg").expect("url"),
            "https://sso.heroku.com/saml/myorg/init?cli=true"
        );
    }

    #[test]
    fn test_sso_init_url_encodes_organization() {
        assert_eq!(
            sso_init_url("https://sso.heroku.com", "my org/x?y").expect("url"),
            "https://sso.heroku.com/saml/my%20org%2Fx%3Fy/init?cli=true"
        );
    }

    #[test]
    fn test_sso_init_url_rejects_bad_base() {
        assert!(matches!(
            sso_init_url("not a url", "myorg"),
            Err(AuthError::InvalidSsoUrl(_))
        ));
        assert!(matches!(
            sso_init_url("mailto:someone@example.com", "myorg"),
            Err(AuthError::InvalidSsoUrl(_))
        ));
    }
}
