//! Attribute cleanup against the style sheet allow-list.

use ego_tree::NodeId;

use super::Selectors;
use crate::dom::Dom;
use crate::models::AllowList;

/// Prefix marking attributes as internal to the source site
pub const INTERNAL_ATTR_PREFIX: &str = "data-";

/// Cleans every descendant of `scope`; `scope` itself is not serialized
pub fn sanitize_attributes(
    dom: &mut Dom,
    scope: NodeId,
    selectors: &Selectors,
    allow_list: &AllowList,
) {
    for id in dom.select(scope, &selectors.any) {
        dom.remove_attrs(id, |name| {
            name.eq_ignore_ascii_case("tabindex") || name.starts_with(INTERNAL_ATTR_PREFIX)
        });
        dom.retain_classes(id, |class| allow_list.allows_class(class));
        let keep_id = dom.attr(id, "id").is_some_and(|v| allow_list.allows_id(v));
        if !keep_id {
            dom.remove_attrs(id, |name| name == "id");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentSelectors;
    use crate::dom::compile;

    fn selectors() -> Selectors {
        Selectors::new(&ContentSelectors::default()).unwrap()
    }

    fn allow_list() -> AllowList {
        AllowList::new(["textbox", "wp-caption"], ["keep-me"])
    }

    #[test]
    fn strips_internal_attributes_and_unknown_tokens() {
        let mut dom = Dom::parse_fragment(concat!(
            r#"<div class="textbox os-note" data-type="note" tabindex="-1" id="drop">"#,
            r#"<p class="os-para" id="keep-me" title="t">x</p></div>"#
        ));
        let root = dom.root();
        sanitize_attributes(&mut dom, root, &selectors(), &allow_list());
        assert_eq!(
            dom.to_html(),
            r#"<div class="textbox"><p id="keep-me" title="t">x</p></div>"#
        );
    }

    #[test]
    fn leaves_scope_element_untouched() {
        let mut dom = Dom::parse_fragment(r#"<main id="main" data-x="1"><b data-y="2">b</b></main>"#);
        let main = dom.select_first(dom.root(), &compile("main").unwrap()).unwrap();
        sanitize_attributes(&mut dom, main, &selectors(), &allow_list());
        assert_eq!(dom.to_html(), r#"<main id="main" data-x="1"><b>b</b></main>"#);
    }
}
