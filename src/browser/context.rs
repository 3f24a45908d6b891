//! Isolated browsing context for one navigation.
//!
//! Holds the page created inside a fresh browser context and exposes what the
//! table-of-contents discoverer needs from it. Every opened context must be
//! handed back through [`BrowsingContext::close`].

use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::BrowserError;

pub struct BrowsingContext<'b> {
    browser: &'b Browser,
    context_id: BrowserContextId,
    page: Page,
}

impl<'b> BrowsingContext<'b> {
    pub async fn open(browser: &'b Browser) -> Result<Self, BrowserError> {
        let created = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|source| BrowserError::ContextFailed { source })?;
        let context_id = created.result.browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(|message| BrowserError::navigation_failed("about:blank", message))?;

        match browser.new_page(target).await {
            Ok(page) => {
                debug!("opened browsing context {:?}", context_id);
                Ok(Self {
                    browser,
                    context_id,
                    page,
                })
            }
            Err(source) => {
                dispose(browser, context_id).await;
                Err(BrowserError::ContextFailed { source })
            }
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Evaluates `js` in the page and deserializes its result
    pub async fn eval_as<T: DeserializeOwned>(&self, js: &str) -> Result<T, BrowserError> {
        let result = self
            .page
            .evaluate(js.to_string())
            .await
            .map_err(|e| BrowserError::ExtractFailed {
                message: e.to_string(),
            })?;
        result
            .into_value::<T>()
            .map_err(|e| BrowserError::ExtractFailed {
                message: e.to_string(),
            })
    }

    /// Closes the page and disposes the context; failures are only logged
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            warn!("failed to close page: {}", e);
        }
        dispose(self.browser, self.context_id).await;
    }
}

async fn dispose(browser: &Browser, context_id: BrowserContextId) {
    let id = format!("{:?}", context_id);
    match browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        Ok(_) => debug!("disposed browsing context {}", id),
        Err(e) => warn!("failed to dispose browsing context {}: {}", id, e),
    }
}
