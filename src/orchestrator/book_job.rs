//! One whole-textbook export.
//!
//! discover → parse → fetch and transform every subsection through the shared
//! gate → assemble the export document. Subsection failures are logged and
//! leave that subsection's content empty; everything else aborts the job.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::governor::ConcurrencyGovernor;
use crate::browser::TocDiscoverer;
use crate::config::{Config, FeedConfig};
use crate::error::{AppResult, ConfigError, SubsectionError};
use crate::models::{book_slug_from_url, Book, Part};
use crate::services::{build_export, TocParser};
use crate::utils::logging;
use crate::workflow::SubsectionFlow;

/// Finished export of one book
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub book: Book,
    pub xml: String,
}

impl ExportOutcome {
    pub fn part_count(&self) -> usize {
        self.book.parts.len()
    }

    pub fn subsection_count(&self) -> usize {
        self.book.subsection_count()
    }
}

pub struct BookExporter {
    discoverer: Arc<dyn TocDiscoverer>,
    parser: TocParser,
    flow: Arc<SubsectionFlow>,
    governor: Arc<ConcurrencyGovernor>,
    feed: FeedConfig,
}

impl BookExporter {
    pub fn new(
        config: &Config,
        discoverer: Arc<dyn TocDiscoverer>,
        flow: Arc<SubsectionFlow>,
        governor: Arc<ConcurrencyGovernor>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            discoverer,
            parser: TocParser::new(&config.toc)?,
            flow,
            governor,
            feed: config.feed.clone(),
        })
    }

    pub fn governor(&self) -> &Arc<ConcurrencyGovernor> {
        &self.governor
    }

    /// Runs the pipeline for `url`. The caller holds the job permit.
    pub async fn export(&self, url: &str) -> AppResult<ExportOutcome> {
        let slug = book_slug_from_url(url);
        logging::log_job_start(&slug, url);

        let snapshot = self.discoverer.discover(url).await?;
        let mut parts = self.parser.parse(&snapshot.markup, url)?;
        info!(
            "[job {}] 📚 {} parts, {} subsections",
            slug,
            parts.len(),
            parts.iter().map(|p| p.subsections.len()).sum::<usize>()
        );

        let mut degraded = 0;
        for part in parts.iter_mut() {
            degraded += self.fill_part(&slug, part).await;
        }

        let book = Book {
            title: snapshot.title.unwrap_or_else(|| slug.clone()),
            slug,
            source_url: url.to_string(),
            parts,
        };
        let xml = build_export(&book, &self.feed, Utc::now())?;

        logging::log_job_complete(
            &book.slug,
            book.parts.len(),
            book.subsection_count(),
            degraded,
        );
        Ok(ExportOutcome { book, xml })
    }

    /// Fills every subsection's content; returns how many came back empty on failure
    async fn fill_part(&self, slug: &str, part: &mut Part) -> usize {
        let mut handles = Vec::with_capacity(part.subsections.len());

        for subsection in &part.subsections {
            let permit = self.governor.acquire_subsection().await;
            let flow = self.flow.clone();
            let url = subsection.url.clone();
            let title = subsection.title.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit?;
                flow.run(&url, &title).await
            });
            handles.push((subsection.id, handle));
        }

        let mut degraded = 0;
        // Awaited in issue order so results land on their own subsection
        for (subsection, (id, handle)) in part.subsections.iter_mut().zip(handles) {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(SubsectionError::Join(e.to_string())));
            subsection.content = match result {
                Ok(content) => content,
                Err(e) => {
                    warn!("[job {}] [subsection {}] ⚠️ {}: {}", slug, id, subsection.url, e);
                    degraded += 1;
                    String::new()
                }
            };
        }
        degraded
    }
}
