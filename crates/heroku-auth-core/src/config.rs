//! Application configuration management.
//!
//! This module handles loading the application configuration,
//! which holds the API endpoint, the SSO base URL, the secondary git host
//! and an optional netrc location override.
//!
//! Configuration is stored at `~/.config/heroku-auth/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

use crate::api::DEFAULT_API_URL;

/// Application name used for config directory paths
const APP_NAME: &str = "heroku-auth";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_SSO_BASE_URL: &str = "https://sso.heroku.com";

/// Host used by the git transport; receives the same credentials as the API host
pub const DEFAULT_GIT_HOST: &str = "git.heroku.com";

/// Environment variable naming the organization for SSO logins
pub const ORGANIZATION_ENV: &str = "HEROKU_ORGANIZATION";

/// Environment variable overriding the full SSO initiation URL
pub const SSO_URL_ENV: &str = "SSO_URL";

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_url: Option<String>,
    pub sso_base_url: Option<String>,
    pub git_host: Option<String>,
    pub netrc_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn sso_base_url(&self) -> &str {
        self.sso_base_url.as_deref().unwrap_or(DEFAULT_SSO_BASE_URL)
    }

    pub fn git_host(&self) -> &str {
        self.git_host.as_deref().unwrap_or(DEFAULT_GIT_HOST)
    }

    /// Location of the netrc file; `_netrc` in the home directory on Windows
    pub fn netrc_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.netrc_path {
            return Ok(path.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        let file = if cfg!(windows) { "_netrc" } else { ".netrc" };
        Ok(home.join(file))
    }
}

/// Flow hints taken from the environment once, at the CLI boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvHints {
    pub organization: Option<String>,
    pub sso_url: Option<String>,
}

impl EnvHints {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build hints from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            organization: read(ORGANIZATION_ENV),
            sso_url: read(SSO_URL_ENV),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url(), "https://api.heroku.com");
        assert_eq!(config.sso_base_url(), "https://sso.heroku.com");
        assert_eq!(config.git_host(), "git.heroku.com");
    }

    #[test]
    fn test_netrc_path_override() {
        let config = Config {
            netrc_path: Some(PathBuf::from("/tmp/custom-netrc")),
            ..Config::default()
        };
        assert_eq!(
            config.netrc_path().expect("netrc path"),
            PathBuf::from("/tmp/custom-netrc")
        );
    }

    #[test]
    fn test_config_parses_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{"git_host": "git.example.com"}"#).expect("parse config");
        assert_eq!(config.git_host(), "git.example.com");
        assert_eq!(config.api_url(), "https://api.heroku.com");
    }

    #[test]
    fn test_env_hints_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("HEROKU_ORGANIZATION", "myorg"),
            ("SSO_URL", ""),
        ]
        .into_iter()
        .collect();

        let hints = EnvHints::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(hints.organization.as_deref(), Some("myorg"));
        assert_eq!(hints.sso_url, None);
    }
}
