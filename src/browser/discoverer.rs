//! Table-of-contents discovery in the rendering engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use super::context::BrowsingContext;
use super::engine::EngineManager;
use crate::config::TocSelectors;
use crate::error::BrowserError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Raw table of contents as revealed on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocSnapshot {
    /// Document title of the source page, if it had one
    pub title: Option<String>,
    /// Serialized markup of the revealed table-of-contents element
    pub markup: String,
}

/// Source of table-of-contents markup for a book URL
#[async_trait]
pub trait TocDiscoverer: Send + Sync {
    async fn discover(&self, url: &str) -> Result<TocSnapshot, BrowserError>;
}

/// Drives the shared rendering engine to reveal and read the table of contents
pub struct BrowserTocDiscoverer {
    engine: Arc<EngineManager>,
    selectors: TocSelectors,
    wait_ceiling: Duration,
}

impl BrowserTocDiscoverer {
    pub fn new(engine: Arc<EngineManager>, selectors: TocSelectors, wait_ceiling: Duration) -> Self {
        Self {
            engine,
            selectors,
            wait_ceiling,
        }
    }

    async fn discover_in(
        &self,
        ctx: &BrowsingContext<'_>,
        url: &str,
    ) -> Result<TocSnapshot, BrowserError> {
        let page = ctx.page();

        timeout(self.wait_ceiling, page.goto(url))
            .await
            .map_err(|_| BrowserError::timeout(format!("navigation to {}", url), self.wait_ceiling))?
            .map_err(|e| BrowserError::navigation_failed(url, e))?;
        debug!("navigated to {}", url);

        let reveal = &self.selectors.reveal_control;
        self.wait_for(ctx, &interactable_js(reveal), reveal).await?;
        page.find_element(reveal.as_str())
            .await
            .map_err(|e| BrowserError::navigation_failed(url, e))?
            .click()
            .await
            .map_err(|e| BrowserError::navigation_failed(url, e))?;
        debug!("activated {}", reveal);

        let container = &self.selectors.container;
        self.wait_for(ctx, &visible_js(container), container).await?;

        let markup = page
            .find_element(container.as_str())
            .await
            .map_err(|e| BrowserError::ExtractFailed {
                message: e.to_string(),
            })?
            .outer_html()
            .await
            .map_err(|e| BrowserError::ExtractFailed {
                message: e.to_string(),
            })?
            .ok_or_else(|| BrowserError::ExtractFailed {
                message: format!("{} has no markup", container),
            })?;

        let title = page
            .get_title()
            .await
            .ok()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(TocSnapshot { title, markup })
    }

    /// Polls `predicate` until it yields `true`, bounded by the wait ceiling
    async fn wait_for(
        &self,
        ctx: &BrowsingContext<'_>,
        predicate: &str,
        what: &str,
    ) -> Result<(), BrowserError> {
        let poll = async {
            loop {
                // Evaluation errors while the page settles count as "not yet"
                if let Ok(true) = ctx.eval_as::<bool>(predicate).await {
                    return;
                }
                sleep(POLL_INTERVAL).await;
            }
        };
        timeout(self.wait_ceiling, poll)
            .await
            .map_err(|_| BrowserError::timeout(what, self.wait_ceiling))
    }
}

#[async_trait]
impl TocDiscoverer for BrowserTocDiscoverer {
    async fn discover(&self, url: &str) -> Result<TocSnapshot, BrowserError> {
        info!("🔍 discovering table of contents: {}", url);
        let engine = self.engine.acquire().await?;
        let ctx = BrowsingContext::open(engine.browser()).await?;
        let result = self.discover_in(&ctx, url).await;
        ctx.close().await;
        result
    }
}

fn query_js(selector: &str) -> String {
    // serde_json quoting yields a valid JS string literal
    let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!("document.querySelector({})", literal)
}

fn visible_js(selector: &str) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return false; \
         const style = window.getComputedStyle(el); \
         return style.display !== 'none' && style.visibility !== 'hidden' \
         && el.getClientRects().length > 0; }})()",
        query_js(selector)
    )
}

fn interactable_js(selector: &str) -> String {
    format!(
        "(() => {{ const el = {}; return !!el && !el.disabled && el.getClientRects().length > 0; }})()",
        query_js(selector)
    )
}
