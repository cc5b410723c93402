use async_trait::async_trait;
use thiserror::Error;

/// The browser could not be launched. Never fatal to a login.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BrowserError(pub String);

#[async_trait]
pub trait BrowserOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), BrowserError>;
}

/// Opens URLs with the desktop's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

#[async_trait]
impl BrowserOpener for SystemBrowser {
    async fn open(&self, url: &str) -> Result<(), BrowserError> {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || open::that(&url))
            .await
            .map_err(|e| BrowserError(e.to_string()))?
            .map_err(|e| BrowserError(e.to_string()))
    }
}
