use tracing::debug;

use crate::error::SubsectionError;
use crate::services::SubsectionFetcher;
use crate::transform::{ContentTransformer, PageContext};

/// Fetch-then-transform for one subsection.
///
/// Holds no page or engine resources; one instance is shared by all tasks.
pub struct SubsectionFlow {
    fetcher: SubsectionFetcher,
    transformer: ContentTransformer,
}

impl SubsectionFlow {
    pub fn new(fetcher: SubsectionFetcher, transformer: ContentTransformer) -> Self {
        Self {
            fetcher,
            transformer,
        }
    }

    pub async fn run(&self, url: &str, title: &str) -> Result<String, SubsectionError> {
        let html = self.fetcher.fetch(url).await?;
        debug!("fetched {} ({} bytes)", url, html.len());
        let content = self.transformer.transform(&html, &PageContext { url, title })?;
        Ok(content)
    }
}
