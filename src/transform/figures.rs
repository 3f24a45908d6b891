//! Figure restructuring.
//!
//! Consumes and produces the page tree. Lazy-loaded image sources become
//! absolute `src` attributes, figures get presentation classes, and a
//! `figcaption` is replaced by a trailing caption paragraph.

use ego_tree::NodeId;
use url::Url;

use super::Selectors;
use crate::dom::Dom;

pub const LAZY_SRC_ATTR: &str = "data-lazy-src";
pub const FIGURE_CLASSES: &str = "wp-caption aligncenter";
pub const CAPTION_CLASS: &str = "wp-caption-text";

pub fn restructure_figures(dom: &mut Dom, scope: NodeId, selectors: &Selectors, page_url: &str) {
    let base = Url::parse(page_url).ok();

    for figure in dom.select(scope, &selectors.figure) {
        for img in dom.select(figure, &selectors.image) {
            let source = dom
                .attr(img, LAZY_SRC_ATTR)
                .or_else(|| dom.attr(img, "src"))
                .map(str::to_string);
            if let Some(source) = source {
                let absolute = absolutize(base.as_ref(), &source);
                dom.set_attr(img, "src", &absolute);
            }
        }

        dom.add_classes(figure, FIGURE_CLASSES);

        if let Some(caption) = dom.select_first(figure, &selectors.figcaption) {
            let replacement = dom.create_element("p", &[("class", CAPTION_CLASS)]);
            for child in dom.children(caption) {
                dom.append(replacement, child);
            }
            dom.detach(caption);
            dom.append(figure, replacement);
        }
    }
}

fn absolutize(base: Option<&Url>, source: &str) -> String {
    if Url::parse(source).is_ok() {
        return source.to_string();
    }
    base.and_then(|b| b.join(source).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentSelectors;
    use crate::dom::compile;

    fn selectors() -> Selectors {
        Selectors::new(&ContentSelectors::default()).unwrap()
    }

    #[test]
    fn rewrites_lazy_source_and_moves_caption() {
        let mut dom = Dom::parse_fragment(
            r#"<div id="m"><figure id="f"><figcaption>Figure <b>1</b></figcaption><img data-lazy-src="../resources/a.jpg" src="data:placeholder"></figure></div>"#,
        );
        let main = dom.select_first(dom.root(), &compile("#m").unwrap()).unwrap();
        restructure_figures(&mut dom, main, &selectors(), "https://openstax.org/books/physics/pages/1-1");
        assert_eq!(
            dom.inner_html(main),
            r#"<figure id="f" class="wp-caption aligncenter"><img data-lazy-src="../resources/a.jpg" src="https://openstax.org/books/physics/resources/a.jpg"><p class="wp-caption-text">Figure <b>1</b></p></figure>"#
        );
    }

    #[test]
    fn keeps_absolute_sources() {
        let mut dom = Dom::parse_fragment(
            r#"<figure><img src="https://cdn.example.com/x.png"></figure>"#,
        );
        let root = dom.root();
        restructure_figures(&mut dom, root, &selectors(), "https://openstax.org/books/b/pages/p");
        assert_eq!(
            dom.to_html(),
            r#"<figure class="wp-caption aligncenter"><img src="https://cdn.example.com/x.png"></figure>"#
        );
    }
}
