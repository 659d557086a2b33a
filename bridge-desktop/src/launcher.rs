//! URL Launcher using the OS default handler

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    launcher::UrlLauncher,
};
use std::collections::HashSet;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

/// Desktop launcher delegating to `open` (macOS), `start` (Windows) or
/// `xdg-open` (everything else).
///
/// Desktops have no cheap way to ask whether an app scheme is registered, so
/// only `http`/`https` plus the schemes passed to
/// [`with_schemes`](SystemUrlLauncher::with_schemes) report `can_open == true`.
#[derive(Debug, Clone, Default)]
pub struct SystemUrlLauncher {
    app_schemes: HashSet<String>,
}

impl SystemUrlLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare app schemes known to be registered on this machine
    /// (e.g. `["spotify"]` when the Spotify desktop client is installed).
    pub fn with_schemes<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            app_schemes: schemes
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    fn supports(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => match parsed.scheme() {
                "http" | "https" => true,
                scheme => self.app_schemes.contains(scheme),
            },
            Err(_) => false,
        }
    }

    fn command_for(url: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

#[async_trait]
impl UrlLauncher for SystemUrlLauncher {
    async fn can_open(&self, url: &str) -> bool {
        self.supports(url)
    }

    async fn open(&self, url: &str) -> Result<()> {
        if !self.supports(url) {
            return Err(BridgeError::NotAvailable(format!(
                "No handler registered for {}",
                url
            )));
        }

        let status = Self::command_for(url).status().await.map_err(|e| {
            warn!(error = %e, "Failed to spawn URL opener");
            BridgeError::Io(e)
        })?;

        if !status.success() {
            return Err(BridgeError::OperationFailed(format!(
                "URL opener exited with {}",
                status
            )));
        }

        debug!(url = url, "Opened URL");
        Ok(())
    }
}
