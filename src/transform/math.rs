//! MathML to `[latex]` span replacement.

use ego_tree::NodeId;

use super::Selectors;
use crate::dom::Dom;
use crate::error::MathError;
use crate::mathml;

pub const LATEX_OPEN: &str = "[latex]";
pub const LATEX_CLOSE: &str = "[/latex]";

/// Replaces every attached `math` element with a span of delimited LaTeX.
///
/// Annotation children are dropped before conversion, so alternate encodings
/// never leak into the output. The first conversion failure aborts the pass.
pub fn convert_math(dom: &mut Dom, scope: NodeId, selectors: &Selectors) -> Result<(), MathError> {
    for id in dom.select(scope, &selectors.math) {
        if !dom.is_attached(id) {
            continue;
        }

        for annotation in dom.select(id, &selectors.annotation) {
            dom.detach(annotation);
        }
        let latex = mathml::to_latex(&dom.outer_html(id))?;

        let span = dom.create_element("span", &[]);
        dom.set_text(span, &format!("{LATEX_OPEN}{latex}{LATEX_CLOSE}"));
        dom.replace_with(id, span);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentSelectors;

    fn selectors() -> Selectors {
        Selectors::new(&ContentSelectors::default()).unwrap()
    }

    #[test]
    fn replaces_math_with_delimited_span() {
        let mut dom = Dom::parse_fragment(concat!(
            "<p>Speed is <math><semantics><mrow><mfrac><mi>d</mi><mi>t</mi></mfrac></mrow>",
            "<annotation encoding=\"application/x-tex\">\\frac{d}{t}</annotation></semantics></math>.</p>"
        ));
        let root = dom.root();
        convert_math(&mut dom, root, &selectors()).unwrap();
        assert_eq!(dom.to_html(), "<p>Speed is <span>[latex]\\frac{d}{t}[/latex]</span>.</p>");
    }

    #[test]
    fn annotation_text_is_not_duplicated() {
        let mut dom = Dom::parse_fragment(
            "<math><mi>x</mi><annotation-xml encoding=\"MathML-Content\"><ci>x</ci></annotation-xml></math>",
        );
        let root = dom.root();
        convert_math(&mut dom, root, &selectors()).unwrap();
        assert_eq!(dom.to_html(), "<span>[latex]x[/latex]</span>");
    }

    #[test]
    fn leaves_tree_without_math_unchanged() {
        let mut dom = Dom::parse_fragment("<p>a &lt; b</p>");
        let root = dom.root();
        convert_math(&mut dom, root, &selectors()).unwrap();
        assert_eq!(dom.to_html(), "<p>a &lt; b</p>");
    }
}
