//! Attribution block appended after the rewritten content.

use ego_tree::NodeId;

use crate::config::AttributionConfig;
use crate::dom::Dom;

use super::PageContext;

pub const ATTRIBUTION_CLASS: &str = "attribution";

/// Appends `<hr>` and a paragraph linking the page, the book and the license
pub fn inject_attribution(
    dom: &mut Dom,
    scope: NodeId,
    page: &PageContext<'_>,
    attribution: &AttributionConfig,
) {
    let rule = dom.create_element("hr", &[]);
    dom.append(scope, rule);

    let block = dom.create_element("div", &[("class", ATTRIBUTION_CLASS)]);
    let paragraph = dom.create_element("p", &[]);
    dom.append(block, paragraph);

    push_text(dom, paragraph, "This section is adapted from ");
    push_link(dom, paragraph, page.url, page.title);
    push_text(dom, paragraph, " in ");
    push_link(dom, paragraph, &attribution.book_url, &attribution.book_title);
    push_text(dom, paragraph, ", licensed under ");
    push_link(dom, paragraph, &attribution.license_url, &attribution.license_name);
    push_text(dom, paragraph, ".");

    dom.append(scope, block);
}

fn push_text(dom: &mut Dom, parent: NodeId, text: &str) {
    let node = dom.create_text(text);
    dom.append(parent, node);
}

fn push_link(dom: &mut Dom, parent: NodeId, href: &str, label: &str) {
    let link = dom.create_element("a", &[("href", href)]);
    dom.set_text(link, label);
    dom.append(parent, link);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_separator_and_links() {
        let mut dom = Dom::parse_fragment("<p>body</p>");
        let root = dom.root();
        let page = PageContext {
            url: "https://openstax.org/books/physics/pages/1-1-intro",
            title: "1.1 Physics & Matter",
        };
        inject_attribution(&mut dom, root, &page, &AttributionConfig::default());
        assert_eq!(
            dom.to_html(),
            concat!(
                r#"<p>body</p><hr><div class="attribution"><p>This section is adapted from "#,
                r#"<a href="https://openstax.org/books/physics/pages/1-1-intro">1.1 Physics &amp; Matter</a> in "#,
                r#"<a href="https://openstax.org/subjects">OpenStax</a>, licensed under "#,
                r#"<a href="https://creativecommons.org/licenses/by/4.0/">CC BY 4.0</a>.</p></div>"#
            )
        );
    }
}
