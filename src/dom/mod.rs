//! Mutable document tree.
//!
//! Wraps a parsed `scraper::Html` and edits its `ego_tree` nodes in place.
//! Passes query with [`Selector`]s scoped to a node and serialize through
//! html5ever. Nodes removed from the tree stay orphaned in the arena and are
//! never serialized.

mod classes;

use ego_tree::NodeId;
use html5ever::{ns, Attribute, LocalName, QualName};
use scraper::node::{Element, Text};
use scraper::{CaseSensitivity, ElementRef, Html, Node, StrTendril};

pub use scraper::Selector;

use crate::error::ConfigError;

/// Compiles a configured CSS selector
pub fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::invalid_selector(selector, e.to_string()))
}

#[derive(Debug)]
pub struct Dom {
    html: Html,
    root: NodeId,
}

impl Dom {
    pub fn parse_document(html: &str) -> Self {
        Self::wrap(Html::parse_document(html))
    }

    /// Parses a body fragment; its top-level nodes become children of [`Dom::root`]
    pub fn parse_fragment(html: &str) -> Self {
        Self::wrap(Html::parse_fragment(html))
    }

    fn wrap(html: Html) -> Self {
        let root = {
            let top = html.tree.root();
            top.children()
                .find(|c| c.value().is_element())
                .map(|c| c.id())
                .unwrap_or_else(|| top.id())
        };
        Self { html, root }
    }

    /// The `<html>` element both parse modes produce
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn element_ref(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.element_ref(id).map(|e| e.value())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|e| e.has_class(class, CaseSensitivity::CaseSensitive))
    }

    // ========== queries ==========

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.element_ref(id).is_some_and(|e| selector.matches(&e))
    }

    /// Descendant elements of `scope` (excluding `scope`) in document order
    pub fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.element_ref(scope)
            .map(|e| e.select(selector).map(|m| m.id()).collect())
            .unwrap_or_default()
    }

    pub fn select_first(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.element_ref(scope)?
            .select(selector)
            .next()
            .map(|m| m.id())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|n| n.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.element_ref(id)
            .map(|e| e.child_elements().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    /// Element siblings after `id`, nearest first
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|n| {
                n.next_siblings()
                    .filter(|s| s.value().is_element())
                    .map(|s| s.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Concatenated descendant text
    pub fn text(&self, id: NodeId) -> String {
        self.html
            .tree
            .get(id)
            .map(|n| {
                n.descendants()
                    .filter_map(|d| d.value().as_text())
                    .map(|t| &*t.text)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let top = self.html.tree.root().id();
        self.html
            .tree
            .get(id)
            .is_some_and(|n| n.id() == top || n.ancestors().any(|a| a.id() == top))
    }

    // ========== mutation ==========

    /// Creates a detached HTML element
    pub fn create_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs.iter().map(|(k, v)| attribute(k, v)).collect();
        let element = Element::new(QualName::new(None, ns!(html), LocalName::from(name)), attrs);
        self.html.tree.orphan(Node::Element(element)).id()
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        let text = Text {
            text: StrTendril::from(text),
        };
        self.html.tree.orphan(Node::Text(text)).id()
    }

    /// Moves `child` (detaching it first) to the end of `parent`
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(parent) {
            node.append_id(child);
        }
    }

    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(parent) {
            node.prepend_id(child);
        }
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Puts `replacement` where `old` was and detaches `old`
    pub fn replace_with(&mut self, old: NodeId, replacement: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(old) {
            node.insert_id_before(replacement);
            node.detach();
        }
    }

    /// Moves all children of `parent` into a new wrapper element appended to `parent`
    pub fn wrap_children(&mut self, parent: NodeId, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let wrapper = self.create_element(name, attrs);
        if let Some(mut node) = self.html.tree.get_mut(wrapper) {
            node.reparent_from_id_append(parent);
        }
        self.append(parent, wrapper);
        wrapper
    }

    /// Replaces all children of `id` with one text node
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        for child in self.children(id) {
            self.detach(child);
        }
        let text = self.create_text(text);
        self.append(id, text);
    }

    // ========== attributes ==========

    /// Overwrites in place when present, keeping the attribute's position
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.edit_attrs(id, |attrs| {
            match attrs.iter_mut().find(|a| &*a.name.local == name) {
                Some(attr) => attr.value = StrTendril::from(value),
                None => attrs.push(attribute(name, value)),
            }
        });
    }

    /// Drops every attribute whose local name satisfies `reject`
    pub fn remove_attrs(&mut self, id: NodeId, mut reject: impl FnMut(&str) -> bool) {
        self.edit_attrs(id, |attrs| attrs.retain(|a| !reject(&*a.name.local)));
    }

    /// Appends each class token not already present
    pub fn add_classes(&mut self, id: NodeId, classes: &str) {
        let merged = classes::merge(self.attr(id, "class"), classes);
        if !merged.is_empty() {
            self.set_attr(id, "class", &merged);
        }
    }

    /// Keeps matching class tokens in order; drops the attribute when none remain
    pub fn retain_classes(&mut self, id: NodeId, keep: impl FnMut(&str) -> bool) {
        let Some(current) = self.attr(id, "class") else {
            return;
        };
        match classes::retain(current, keep) {
            Some(kept) => self.set_attr(id, "class", &kept),
            None => self.remove_attrs(id, |name| name == "class"),
        }
    }

    /// Rebuilds the element at `id` from its edited attribute list.
    ///
    /// scraper caches each element's id and classes on first lookup, so the
    /// attribute map is never edited in place.
    fn edit_attrs(&mut self, id: NodeId, edit: impl FnOnce(&mut Vec<Attribute>)) {
        let Some(mut node) = self.html.tree.get_mut(id) else {
            return;
        };
        let Node::Element(element) = node.value() else {
            return;
        };
        let mut attrs: Vec<Attribute> = element
            .attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        edit(&mut attrs);
        *element = Element::new(element.name.clone(), attrs);
    }

    // ========== serialization ==========

    pub fn outer_html(&self, id: NodeId) -> String {
        self.element_ref(id).map(|e| e.html()).unwrap_or_default()
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        self.element_ref(id)
            .map(|e| e.inner_html())
            .unwrap_or_default()
    }

    pub fn to_html(&self) -> String {
        self.inner_html(self.root)
    }
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, ns!(), LocalName::from(name)),
        value: StrTendril::from(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(dom: &Dom, selector: &str) -> NodeId {
        dom.select_first(dom.root(), &compile(selector).unwrap())
            .unwrap()
    }

    #[test]
    fn fragment_round_trips_markup() {
        let html = r#"<p class="a">x &amp; <b>y</b></p><img src="i.png"><!--c-->"#;
        let dom = Dom::parse_fragment(html);
        assert_eq!(dom.to_html(), html);
    }

    #[test]
    fn keeps_source_attribute_order() {
        let html = r#"<a href="/x" id="z" class="c" data-k="1">x</a>"#;
        assert_eq!(Dom::parse_fragment(html).to_html(), html);
    }

    #[test]
    fn document_parse_finds_nested_elements() {
        let dom = Dom::parse_document(
            r#"<!DOCTYPE html><html><body><div id="main-content"><p>hi</p></div></body></html>"#,
        );
        let main = first(&dom, "#main-content");
        assert_eq!(dom.inner_html(main), "<p>hi</p>");
    }

    #[test]
    fn selectors_support_combinators() {
        let dom = Dom::parse_fragment("<nav><ol><li><a>in</a></li></ol></nav><a>out</a>");
        let links = dom.select(dom.root(), &compile("nav > ol a").unwrap());
        assert_eq!(links.len(), 1);
        assert_eq!(dom.text(links[0]), "in");
        assert!(compile("p >").is_err());
    }

    #[test]
    fn class_edits_are_visible_to_selectors() {
        let mut dom = Dom::parse_fragment(r#"<div class="a"></div>"#);
        let div = first(&dom, "div");
        assert!(dom.matches(div, &compile(".a").unwrap()));
        dom.add_classes(div, "b");
        dom.retain_classes(div, |c| c != "a");
        assert!(dom.matches(div, &compile(".b").unwrap()));
        assert!(!dom.matches(div, &compile(".a").unwrap()));
        assert!(dom.has_class(div, "b"));
    }

    #[test]
    fn set_attr_overwrites_without_reordering() {
        let mut dom = Dom::parse_fragment(r#"<img id="i" src="old" alt="x">"#);
        let img = first(&dom, "img");
        dom.set_attr(img, "src", "new");
        dom.set_attr(img, "title", "t");
        dom.remove_attrs(img, |name| name == "id");
        assert_eq!(dom.to_html(), r#"<img src="new" alt="x" title="t">"#);
    }

    #[test]
    fn wrap_children_moves_everything() {
        let mut dom = Dom::parse_fragment("<section><p>a</p>tail<p>b</p></section>");
        let section = first(&dom, "section");
        let wrapper = dom.wrap_children(section, "div", &[("class", "content")]);
        assert_eq!(dom.child_elements(section), vec![wrapper]);
        assert_eq!(
            dom.outer_html(section),
            r#"<section><div class="content"><p>a</p>tail<p>b</p></div></section>"#
        );
    }

    #[test]
    fn replace_and_detach() {
        let mut dom = Dom::parse_fragment("<p><i>old</i> text</p>");
        let old = first(&dom, "i");
        let span = dom.create_element("span", &[]);
        dom.set_text(span, "new");
        dom.replace_with(old, span);
        assert_eq!(dom.to_html(), "<p><span>new</span> text</p>");
        assert!(!dom.is_attached(old));
        assert!(dom.select(dom.root(), &compile("i").unwrap()).is_empty());
    }

    #[test]
    fn following_siblings_skip_text() {
        let dom = Dom::parse_fragment("<b>1</b> <i>2</i> <em>3</em>");
        let b = first(&dom, "b");
        let names: Vec<_> = dom
            .following_siblings(b)
            .into_iter()
            .map(|id| dom.element(id).unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["i", "em"]);
    }

    #[test]
    fn escapes_attribute_quotes_and_text() {
        let mut dom = Dom::parse_fragment("");
        let root = dom.root();
        let a = dom.create_element("a", &[("title", r#"say "hi" <now>"#)]);
        dom.append(root, a);
        dom.set_text(a, "1 < 2");
        assert_eq!(
            dom.to_html(),
            r#"<a title="say &quot;hi&quot; &lt;now&gt;">1 &lt; 2</a>"#
        );
    }
}
