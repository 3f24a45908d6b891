//! Content transformer.
//!
//! Rewrites one fetched subsection page through seven ordered passes over the
//! main content region, then serializes that region. Each pass lives in its
//! own module and takes the tree plus the region's node id.

pub mod attribution;
pub mod figures;
pub mod math;
pub mod sanitize;
pub mod textboxes;

use std::sync::Arc;

use tracing::debug;

use crate::config::{AttributionConfig, Config, ContentSelectors};
use crate::dom::{compile, Dom, Selector};
use crate::error::{ConfigError, TransformError};
use crate::models::AllowList;

/// The subsection being transformed
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub url: &'a str,
    pub title: &'a str,
}

/// Every selector the passes use, compiled once per transformer
#[derive(Debug, Clone)]
pub struct Selectors {
    pub main: Selector,
    pub learning_objectives: Selector,
    pub check_understanding: Selector,
    pub note: Selector,
    pub header: Selector,
    pub figure: Selector,
    pub image: Selector,
    pub figcaption: Selector,
    pub details: Selector,
    pub summary: Selector,
    pub math: Selector,
    pub annotation: Selector,
    pub any: Selector,
}

impl Selectors {
    pub fn new(content: &ContentSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            main: compile(&content.main)?,
            learning_objectives: compile(&content.learning_objectives)?,
            check_understanding: compile(&content.check_understanding)?,
            note: compile(&content.note)?,
            header: compile(&content.header)?,
            figure: compile("figure")?,
            image: compile("img")?,
            figcaption: compile("figcaption")?,
            details: compile("details")?,
            summary: compile("summary")?,
            math: compile("math")?,
            annotation: compile("annotation, annotation-xml")?,
            any: compile("*")?,
        })
    }
}

/// Stateless apart from its compiled selectors; shared by every subsection task
#[derive(Debug, Clone)]
pub struct ContentTransformer {
    selectors: Selectors,
    attribution: AttributionConfig,
    allow_list: Arc<AllowList>,
}

impl ContentTransformer {
    pub fn new(config: &Config, allow_list: Arc<AllowList>) -> Result<Self, ConfigError> {
        Ok(Self {
            selectors: Selectors::new(&config.content)?,
            attribution: config.attribution.clone(),
            allow_list,
        })
    }

    /// Runs every pass over `html` and returns the serialized main region
    pub fn transform(&self, html: &str, page: &PageContext<'_>) -> Result<String, TransformError> {
        let mut dom = Dom::parse_document(html);
        let main = dom
            .select_first(dom.root(), &self.selectors.main)
            .ok_or(TransformError::MissingMainContent)?;
        let s = &self.selectors;

        figures::restructure_figures(&mut dom, main, s, page.url);
        textboxes::restructure_learning_objectives(&mut dom, main, s);
        textboxes::restructure_check_understanding(&mut dom, main, s);
        textboxes::restructure_notes(&mut dom, main, s);
        attribution::inject_attribution(&mut dom, main, page, &self.attribution);
        sanitize::sanitize_attributes(&mut dom, main, s, &self.allow_list);
        math::convert_math(&mut dom, main, s)?;

        let output = trim_invisible(&dom.inner_html(main)).to_string();
        debug!("transformed {} into {} bytes", page.url, output.len());
        Ok(output)
    }
}

/// How the serializer writes U+00A0
const NBSP_ENTITY: &str = "&nbsp;";

/// Whitespace plus zero-width and non-breaking markers
fn is_invisible(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{200B}' | '\u{FEFF}' | '\u{00A0}')
}

/// Strips invisible characters and serialized non-breaking spaces from both ends
fn trim_invisible(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim_matches(is_invisible);
        let trimmed = trimmed.strip_prefix(NBSP_ENTITY).unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix(NBSP_ENTITY).unwrap_or(trimmed);
        if trimmed.len() == s.len() {
            return trimmed;
        }
        s = trimmed;
    }
}
