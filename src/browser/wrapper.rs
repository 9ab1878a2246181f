//! Browser handle that owns its CDP handler task

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::wait::with_op_timeout;

/// Browser plus its event handler task
///
/// The handler is aborted on drop. A temporary profile directory, when one
/// was created, is removed after that.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    temp_dir: Option<PathBuf>,
    navigation_timeout_secs: u64,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, temp_dir: Option<PathBuf>) -> Self {
        Self {
            browser,
            handler,
            temp_dir,
            navigation_timeout_secs: 30,
        }
    }

    #[must_use]
    pub fn with_navigation_timeout(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs.max(1);
        self
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Reuse an open tab whose URL starts with `url_prefix`, else open one
    ///
    /// Attaching to a running browser usually means the user already has
    /// the target list open; navigating again would lose its scroll state.
    pub async fn page_for(&mut self, url_prefix: &str) -> Result<Page> {
        if let Err(e) = self.browser.fetch_targets().await {
            trace!("Failed to refresh browser targets: {}", e);
        }
        let pages = self.browser.pages().await.context("Failed to list pages")?;
        for page in pages {
            let url = page_url_with_fallback(&page).await;
            if url.starts_with(url_prefix) {
                info!(url = %url, "Reusing open tab");
                return Ok(page);
            }
        }

        debug!(url = url_prefix, "Opening new tab");
        let page = self
            .browser
            .new_page(url_prefix)
            .await
            .with_context(|| format!("Failed to open {url_prefix}"))?;
        with_op_timeout(
            async {
                page.wait_for_navigation()
                    .await
                    .context("Navigation did not complete")?;
                Ok(())
            },
            self.navigation_timeout_secs,
            "Page navigation",
        )
        .await?;
        Ok(page)
    }

    /// Open a second blank page in the same browser context
    pub async fn blank_page(&self) -> Result<Page> {
        self.browser
            .new_page("about:blank")
            .await
            .context("Failed to create blank page")
    }

    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.temp_dir.take() {
            info!("Cleaning up temp directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        debug!("Dropping BrowserWrapper - aborting handler task");
        self.handler.abort();
        self.cleanup_temp_dir();
    }
}

/// Page URL, `"about:blank"` when it is unknown or the query fails
pub async fn page_url_with_fallback(page: &Page) -> String {
    match page.url().await {
        Ok(Some(url)) => url,
        Ok(None) => "about:blank".to_string(),
        Err(e) => {
            trace!("Failed to get page URL (browser communication error): {}", e);
            "about:blank".to_string()
        }
    }
}
