//! Callout box restructuring.
//!
//! Each pass consumes and produces the page tree: the block's native header
//! is removed, its remaining children are wrapped in a content container, a
//! constructed header is prepended and the block is tagged as a textbox.

use ego_tree::NodeId;
use scraper::Selector;

use super::Selectors;
use crate::dom::Dom;

pub const LEARNING_OBJECTIVES_LABEL: &str = "Learning Objectives";
pub const CHECK_UNDERSTANDING_LABEL: &str = "Check Your Understanding";
pub const SOLUTION_SUMMARY_LABEL: &str = "Click for Solution";

pub const LEARNING_OBJECTIVES_CLASSES: &str = "textbox textbox--learning-objectives";
pub const CHECK_UNDERSTANDING_CLASSES: &str = "textbox textbox--exercises";
pub const NOTE_CLASSES: &str = "textbox shaded";

const TEXTBOX_CLASS: &str = "textbox";
const HEADER_CLASS: &str = "textbox__header";
const TITLE_CLASS: &str = "textbox__title";
const CONTENT_CLASS: &str = "textbox__content";

/// First matching block only
pub fn restructure_learning_objectives(dom: &mut Dom, scope: NodeId, selectors: &Selectors) {
    let Some(id) = dom.select_first(scope, &selectors.learning_objectives) else {
        return;
    };
    take_header(dom, id, &selectors.header);
    build_textbox(dom, id, Some(LEARNING_OBJECTIVES_LABEL), LEARNING_OBJECTIVES_CLASSES);
}

pub fn restructure_check_understanding(dom: &mut Dom, scope: NodeId, selectors: &Selectors) {
    for id in pending_blocks(dom, scope, &selectors.check_understanding) {
        take_header(dom, id, &selectors.header);

        for disclosure in dom.select(id, &selectors.details) {
            let existing = dom
                .child_elements(disclosure)
                .into_iter()
                .find(|c| dom.matches(*c, &selectors.summary));
            match existing {
                Some(node) => dom.set_text(node, SOLUTION_SUMMARY_LABEL),
                None => {
                    let node = dom.create_element("summary", &[]);
                    dom.set_text(node, SOLUTION_SUMMARY_LABEL);
                    dom.prepend(disclosure, node);
                }
            }
        }

        build_textbox(dom, id, Some(CHECK_UNDERSTANDING_LABEL), CHECK_UNDERSTANDING_CLASSES);
    }
}

/// The replacement header carries the original header's text
pub fn restructure_notes(dom: &mut Dom, scope: NodeId, selectors: &Selectors) {
    for id in pending_blocks(dom, scope, &selectors.note) {
        let label = take_header(dom, id, &selectors.header).filter(|label| !label.is_empty());
        build_textbox(dom, id, label.as_deref(), NOTE_CLASSES);
    }
}

/// Matching blocks not already turned into textboxes by an earlier pass
fn pending_blocks(dom: &Dom, scope: NodeId, block: &Selector) -> Vec<NodeId> {
    dom.select(scope, block)
        .into_iter()
        .filter(|id| !dom.has_class(*id, TEXTBOX_CLASS))
        .collect()
}

/// Detaches the block's first header child, returning its text read beforehand
fn take_header(dom: &mut Dom, block: NodeId, header: &Selector) -> Option<String> {
    let id = dom
        .child_elements(block)
        .into_iter()
        .find(|c| dom.matches(*c, header))?;
    let text = dom.text(id).split_whitespace().collect::<Vec<_>>().join(" ");
    dom.detach(id);
    Some(text)
}

fn build_textbox(dom: &mut Dom, block: NodeId, label: Option<&str>, classes: &str) {
    dom.wrap_children(block, "div", &[("class", CONTENT_CLASS)]);

    if let Some(label) = label {
        let header = dom.create_element("header", &[("class", HEADER_CLASS)]);
        let title = dom.create_element("p", &[("class", TITLE_CLASS)]);
        dom.set_text(title, label);
        dom.append(header, title);
        dom.prepend(block, header);
    }

    dom.add_classes(block, classes);
}
