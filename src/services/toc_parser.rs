//! Table-of-contents parsing.
//!
//! The revealed table of contents is a flat run of part markers: the first
//! marker in document order and every marker among its siblings. Markers
//! nested deeper, such as the numbers inside subsection links, are not parts.
//! For each marker the parser scans forward through the marker's following
//! siblings, stopping at the next marker, for the first element carrying the
//! title role and the first carrying the subsection-list role. Either may be
//! absent.

use ego_tree::NodeId;
use tracing::debug;
use url::Url;

use crate::config::TocSelectors;
use crate::dom::{compile, Dom, Selector};
use crate::error::{ConfigError, TocError};
use crate::models::Part;

pub struct TocParser {
    marker: Selector,
    title: Selector,
    list: Selector,
    link: Selector,
}

impl TocParser {
    pub fn new(selectors: &TocSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            marker: compile(&selectors.part_marker)?,
            title: compile(&selectors.part_title)?,
            list: compile(&selectors.subsection_list)?,
            link: compile(&selectors.subsection_link)?,
        })
    }

    /// Builds the part hierarchy with ids and order assigned; contents stay empty
    pub fn parse(&self, markup: &str, base_url: &str) -> Result<Vec<Part>, TocError> {
        let base = Url::parse(base_url).map_err(|source| TocError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        let dom = Dom::parse_fragment(markup);

        let mut parts = Vec::new();
        for (order, marker) in self.part_markers(&dom).into_iter().enumerate() {
            let mut title_node = None;
            let mut list_node = None;
            for sibling in dom.following_siblings(marker) {
                if dom.matches(sibling, &self.marker) {
                    break;
                }
                if title_node.is_none() && dom.matches(sibling, &self.title) {
                    title_node = Some(sibling);
                }
                if list_node.is_none() && dom.matches(sibling, &self.list) {
                    list_node = Some(sibling);
                }
                if title_node.is_some() && list_node.is_some() {
                    break;
                }
            }

            let number = non_empty(normalize_whitespace(&dom.text(marker)));
            let title = title_node.and_then(|id| non_empty(normalize_whitespace(&dom.text(id))));
            let mut part = Part::new(order, number, title);

            if let Some(list) = list_node {
                for link in dom.select(list, &self.link) {
                    let Some(href) = dom.attr(link, "href") else {
                        continue;
                    };
                    let Ok(url) = base.join(href) else {
                        debug!("skipping unresolvable subsection link {:?}", href);
                        continue;
                    };
                    part.push_subsection(normalize_whitespace(&dom.text(link)), url.to_string())?;
                }
            }

            debug!(
                "part {} ({:?}): {} subsections",
                part.id,
                part.title,
                part.subsections.len()
            );
            parts.push(part);
        }
        Ok(parts)
    }

    /// The first marker plus the markers among its following siblings
    fn part_markers(&self, dom: &Dom) -> Vec<NodeId> {
        let Some(first) = dom.select_first(dom.root(), &self.marker) else {
            return Vec::new();
        };
        let mut markers = vec![first];
        markers.extend(
            dom.following_siblings(first)
                .into_iter()
                .filter(|s| dom.matches(*s, &self.marker)),
        );
        markers
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://openstax.org/books/physics/pages/1-introduction";

    fn parser() -> TocParser {
        TocParser::new(&TocSelectors::default()).unwrap()
    }

    #[test]
    fn builds_parts_and_subsections() {
        let markup = r#"
            <nav>
              <span class="os-number">1</span>
              <span class="os-divider"> </span>
              <span class="os-text">Units and Measurement</span>
              <ol>
                <li><a href="1-1-the-scope">1.1  The Scope</a></li>
                <li><a href="/books/physics/pages/1-2-units">1.2 Units</a></li>
              </ol>
              <span class="os-number">2</span>
              <span class="os-text">Vectors</span>
              <ol><li><a href="2-1-scalars">2.1 Scalars</a></li></ol>
            </nav>
        "#;
        let parts = parser().parse(markup, BASE).unwrap();
        assert_eq!(parts.len(), 2);

        let first = &parts[0];
        assert_eq!(first.id, 100);
        assert_eq!(first.number.as_deref(), Some("1"));
        assert_eq!(first.title.as_deref(), Some("Units and Measurement"));
        assert_eq!(first.slug, "1");
        assert_eq!(first.order, 0);
        let ids: Vec<_> = first.subsections.iter().map(|s| s.id).collect();
        assert_eq!(ids, [101, 102]);
        assert_eq!(first.subsections[0].title, "1.1 The Scope");
        assert_eq!(
            first.subsections[0].url,
            "https://openstax.org/books/physics/pages/1-1-the-scope"
        );
        assert_eq!(first.subsections[1].slug, "1-2-units");

        assert_eq!(parts[1].id, 200);
        assert_eq!(parts[1].subsections[0].id, 201);
        assert_eq!(parts[1].subsections[0].order, 0);
    }

    #[test]
    fn marker_without_title_or_list_is_tolerated() {
        let markup = r#"
            <div>
              <span class="os-number">Appendix</span>
              <span class="os-number">3</span>
              <span class="os-text">Kinematics</span>
              <ol><li><a href="3-1">3.1</a></li></ol>
            </div>
        "#;
        let parts = parser().parse(markup, BASE).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].title, None);
        assert!(parts[0].subsections.is_empty());
        assert_eq!(parts[0].slug, "appendix");
        assert_eq!(parts[1].title.as_deref(), Some("Kinematics"));
        assert_eq!(parts[1].subsections.len(), 1);
    }

    #[test]
    fn numbers_inside_subsection_links_are_not_parts() {
        let markup = r#"
            <nav>
              <span class="os-number">1</span>
              <span class="os-text">Units and Measurement</span>
              <ol>
                <li><a href="1-1"><span class="os-number">1.1</span> <span class="os-text">The Scope</span></a></li>
                <li><a href="1-2"><span class="os-number">1.2</span> <span class="os-text">Units</span></a></li>
              </ol>
              <span class="os-number">2</span>
              <span class="os-text">Vectors</span>
              <ol><li><a href="2-1"><span class="os-number">2.1</span> Scalars</a></li></ol>
            </nav>
        "#;
        let parts = parser().parse(markup, BASE).unwrap();
        let summary: Vec<_> = parts
            .iter()
            .map(|p| (p.id, p.number.as_deref(), p.subsections.len()))
            .collect();
        assert_eq!(summary, [(100, Some("1"), 2), (200, Some("2"), 1)]);
        assert_eq!(parts[0].subsections[0].title, "1.1 The Scope");
        assert_eq!(parts[1].subsections[0].id, 201);
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = parser().parse("<span class=\"os-number\">1</span>", "not a url");
        assert!(matches!(err, Err(TocError::InvalidUrl { .. })));
    }
}
