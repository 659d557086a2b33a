//! URL Launcher Abstraction
//!
//! Opens outbound links: app schemes (`spotify://`, `youtube://`) and plain
//! web URLs.
//!
//! - iOS: `UIApplication.canOpenURL` / `open`
//! - Android: `PackageManager` intent resolution
//! - Desktop: the OS default handler (`open`, `xdg-open`, `start`)

use async_trait::async_trait;

use crate::error::Result;

/// Outbound URL opener
///
/// `can_open` must be cheap and side-effect free; callers use it to decide
/// between an app deep link and its web fallback before calling `open`.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::launcher::UrlLauncher;
///
/// async fn open_or_web(launcher: &dyn UrlLauncher, app: &str, web: &str) -> Result<()> {
///     if launcher.can_open(app).await {
///         launcher.open(app).await
///     } else {
///         launcher.open(web).await
///     }
/// }
/// ```
#[async_trait]
pub trait UrlLauncher: Send + Sync {
    /// Whether a handler is registered for the URL's scheme
    async fn can_open(&self, url: &str) -> bool;

    /// Hand the URL to the platform
    ///
    /// # Errors
    ///
    /// Returns error if no handler accepted the URL.
    async fn open(&self, url: &str) -> Result<()>;
}
