//! chromiumoxide adapter for the [`PageChannel`] seam.
//!
//! Everything the engine needs from CDP is `Runtime.evaluate` with JSON
//! results; page-scoped globals already persist across evaluations, so the
//! adapter is a thin wrapper over [`chromiumoxide::Page`].

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use serde_json::Value;
use tracing::debug;

use crate::channel::{ChannelError, PageChannel};

/// A [`PageChannel`] over a Chrome DevTools Protocol page.
pub struct CdpChannel {
    page: Page,
}

impl CdpChannel {
    /// Wrap an existing page. The caller keeps the browser and its event
    /// handler alive for the lifetime of the channel.
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Convenience launcher: headless browser, one page at `url`, CDP event
    /// loop spawned in the background. The returned [`Browser`] must be kept
    /// alive; dropping it tears the channel down.
    pub async fn launch(url: &str) -> Result<(Browser, Self), ChannelError> {
        let config = BrowserConfig::builder().build().map_err(ChannelError::new)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| ChannelError::new(err.to_string()))?;

        tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page(url)
            .await
            .map_err(|err| ChannelError::new(err.to_string()))?;
        debug!(url, "cdp page ready");

        Ok((browser, Self::new(page)))
    }
}

#[async_trait]
impl PageChannel for CdpChannel {
    async fn evaluate(&self, script: &str) -> Result<Value, ChannelError> {
        let evaluation = self
            .page
            .evaluate(script)
            .await
            .map_err(|err| ChannelError::new(err.to_string()))?;
        evaluation
            .into_value()
            .map_err(|err| ChannelError::new(err.to_string()))
    }
}
