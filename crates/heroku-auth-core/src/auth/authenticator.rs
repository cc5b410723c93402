//! The login orchestrator.
//!
//! One `login` call runs strictly in order: flow selection, prompts,
//! optional browser launch, one API call, response classification and
//! optional persistence. Any failure ends the call; nothing is retried.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use super::browser::{BrowserOpener, SystemBrowser};
use super::error::AuthError;
use super::flow::Flow;
use super::netrc::{MachineStore, StoreError};
use super::platform::{HostPlatform, Platform};
use super::prompt::{PromptError, Prompter, TerminalPrompter};
use super::types::{AuthRequest, Credential, MachineEntry};
use crate::api::ApiClient;
use crate::config::{DEFAULT_GIT_HOST, DEFAULT_SSO_BASE_URL};

pub const CREDENTIALS_BANNER: &str = "Enter your Heroku credentials:";
pub const EMAIL_PROMPT: &str = "Email";
pub const PASSWORD_PROMPT: &str = "Password";
pub const TOKEN_PROMPT: &str = "Enter your access token (typing will be hidden)";
pub const OPENING_BROWSER: &str = "Opening browser for login... ";

/// Opens the machine store on demand. Logins that do not save never call it.
pub type StoreLoader =
    Box<dyn Fn() -> Result<Box<dyn MachineStore>, StoreError> + Send + Sync>;

pub struct Authenticator {
    api: ApiClient,
    prompter: Box<dyn Prompter>,
    browser: Box<dyn BrowserOpener>,
    platform: Box<dyn Platform>,
    load_store: StoreLoader,
    status: Box<dyn Write + Send>,
    sso_base_url: String,
    git_host: String,
}

impl Authenticator {
    /// Wire the production collaborators: terminal prompts, the system
    /// browser, the host platform and stderr for status lines. The store is
    /// only opened by operations that read or write saved credentials.
    pub fn new<F>(api: ApiClient, load_store: F) -> Self
    where
        F: Fn() -> Result<Box<dyn MachineStore>, StoreError> + Send + Sync + 'static,
    {
        Self {
            api,
            prompter: Box::new(TerminalPrompter),
            browser: Box::new(SystemBrowser),
            platform: Box::new(HostPlatform),
            load_store: Box::new(load_store),
            status: Box::new(io::stderr()),
            sso_base_url: DEFAULT_SSO_BASE_URL.to_string(),
            git_host: DEFAULT_GIT_HOST.to_string(),
        }
    }

    pub fn with_prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    pub fn with_browser(mut self, browser: impl BrowserOpener + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    pub fn with_platform(mut self, platform: impl Platform + 'static) -> Self {
        self.platform = Box::new(platform);
        self
    }

    pub fn with_status(mut self, status: impl Write + Send + 'static) -> Self {
        self.status = Box::new(status);
        self
    }

    pub fn with_sso_base_url(mut self, url: impl Into<String>) -> Self {
        self.sso_base_url = url.into();
        self
    }

    pub fn with_git_host(mut self, host: impl Into<String>) -> Self {
        self.git_host = host.into();
        self
    }

    /// Obtain a credential with the flow `request` selects, saving it to the
    /// machine store afterwards when `request.save` is set.
    pub async fn login(&mut self, request: &AuthRequest) -> Result<Credential, AuthError> {
        let flow = Flow::select(request, self.prompter.as_ref(), &self.sso_base_url).await?;

        let credential = match flow {
            Flow::Password => self.password_login(request.expires_in.get()).await?,
            Flow::Sso { ref url } => self.sso_login(url).await?,
        };
        info!(email = %credential.email, sso = request.sso, "Logged in");

        if request.save {
            self.persist(&credential)?;
        }

        Ok(credential)
    }

    async fn password_login(&mut self, expires_in: u64) -> Result<Credential, AuthError> {
        writeln!(self.status, "{}", CREDENTIALS_BANNER)?;
        self.status.flush()?;

        let email = self.prompter.prompt(EMAIL_PROMPT, false).await?;
        let password = match self.prompter.prompt(PASSWORD_PROMPT, true).await {
            Ok(password) => password,
            Err(PromptError::MaskUnsupported(_)) if self.platform.is_windows() => {
                return Err(AuthError::IncompatibleShell)
            }
            Err(e) => return Err(e.into()),
        };

        let response = self
            .api
            .create_authorization(&email, &password, expires_in)
            .await?;

        let access_token = response
            .access_token
            .ok_or_else(|| AuthError::MalformedResponse("missing access_token".to_string()))?;
        let token = access_token
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("missing access_token.token".to_string()))?;
        let email = response
            .user
            .and_then(|u| u.email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("missing user.email".to_string()))?;

        Ok(Credential {
            token,
            email,
            expires_in: access_token.expires_in,
        })
    }

    async fn sso_login(&mut self, url: &str) -> Result<Credential, AuthError> {
        let opened = self.browser.open(url).await;

        write!(self.status, "{}", OPENING_BROWSER)?;
        writeln!(self.status, "done")?;
        if let Err(e) = opened {
            warn!(error = %e, %url, "Could not open browser");
            writeln!(self.status, "{}", e)?;
        }
        self.status.flush()?;

        let token = self.prompter.prompt(TOKEN_PROMPT, true).await?;
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let account = self.api.fetch_account(&token).await?;
        let email = account
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("missing email".to_string()))?;

        Ok(Credential {
            token,
            email,
            expires_in: None,
        })
    }

    fn persist(&self, credential: &Credential) -> Result<(), AuthError> {
        let mut store = (self.load_store)()?;
        let entry = MachineEntry::from(credential);
        for host in [self.api.host(), self.git_host.as_str()] {
            debug!(%host, "Storing credentials");
            store.set_machine(host, entry.clone());
        }
        store.save()?;
        Ok(())
    }

    /// Email of the account behind the saved API credential.
    pub async fn whoami(&self) -> Result<String, AuthError> {
        let entry = (self.load_store)()?
            .machine(self.api.host())
            .filter(|m| !m.password.is_empty())
            .ok_or(AuthError::NotLoggedIn)?;

        let account = self.api.fetch_account(&entry.password).await?;
        account
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("missing email".to_string()))
    }

    /// Forget the saved credential for both hosts. Returns false if there
    /// was nothing to remove.
    pub fn logout(&self) -> Result<bool, AuthError> {
        let mut store = (self.load_store)()?;
        let api_removed = store.remove_machine(self.api.host());
        let git_removed = store.remove_machine(&self.git_host);
        if !(api_removed || git_removed) {
            return Ok(false);
        }
        store.save()?;
        Ok(true)
    }
}
