use serde::Serialize;

use super::slug::{slug_from_url, slugify};
use crate::error::TocError;

/// Consecutive ids reserved by each part: the part's own id plus its subsections
pub const PART_ID_BLOCK: u32 = 100;

/// Subsections that fit one part's id block
pub const MAX_SUBSECTIONS_PER_PART: usize = (PART_ID_BLOCK - 1) as usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub title: String,
    pub slug: String,
    /// Table-of-contents page the book was scraped from
    pub source_url: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Part {
    pub id: u32,
    /// Display label from the source, e.g. "1" or "Chapter 1"
    pub number: Option<String>,
    pub title: Option<String>,
    pub slug: String,
    pub order: usize,
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subsection {
    pub id: u32,
    pub title: String,
    pub url: String,
    pub slug: String,
    pub order: usize,
    /// Sanitized markup; empty when the fetch or transform failed
    pub content: String,
}

impl Part {
    /// Base of the id block for the part at `order`
    pub fn id_for_order(order: usize) -> u32 {
        (order as u32 + 1) * PART_ID_BLOCK
    }

    pub fn new(order: usize, number: Option<String>, title: Option<String>) -> Self {
        let slug = number
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("part-{}", order + 1));
        Self {
            id: Self::id_for_order(order),
            number,
            title,
            slug,
            order,
            subsections: Vec::new(),
        }
    }

    /// Appends a subsection, allocating the next id in this part's block
    pub fn push_subsection(
        &mut self,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<&Subsection, TocError> {
        let order = self.subsections.len();
        if order >= MAX_SUBSECTIONS_PER_PART {
            return Err(TocError::PartCapacityExceeded {
                part_id: self.id,
                count: order + 1,
                max: MAX_SUBSECTIONS_PER_PART,
            });
        }
        let url = url.into();
        self.subsections.push(Subsection {
            id: self.id + order as u32 + 1,
            title: title.into(),
            slug: slug_from_url(&url),
            url,
            order,
            content: String::new(),
        });
        Ok(&self.subsections[order])
    }

    /// Title shown in the export; falls back to the number, then the slug
    pub fn display_title(&self) -> String {
        match (&self.number, &self.title) {
            (Some(number), Some(title)) => format!("{} {}", number.trim(), title.trim()),
            (None, Some(title)) => title.trim().to_string(),
            (Some(number), None) => number.trim().to_string(),
            (None, None) => self.slug.clone(),
        }
    }
}

impl Book {
    pub fn subsection_count(&self) -> usize {
        self.parts.iter().map(|p| p.subsections.len()).sum()
    }
}
