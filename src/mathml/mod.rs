//! MathML to LaTeX.
//!
//! A pure conversion: the fragment is parsed as XML into a small node tree,
//! then each presentation element is rendered to its LaTeX equivalent.
//! Unknown elements contribute their children's output.

mod symbols;

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::MathError;
use symbols::{is_large_operator, over_accent, symbol, FUNCTIONS};

#[derive(Debug, Clone, PartialEq)]
enum MathNode {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<MathNode>,
    },
    Text(String),
}

/// Converts a serialized `<math>` fragment to LaTeX
pub fn to_latex(fragment: &str) -> Result<String, MathError> {
    let root = parse(fragment)?;
    Ok(render(&root).trim().to_string())
}

// ========== parsing ==========

struct Open {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<MathNode>,
}

fn parse(fragment: &str) -> Result<MathNode, MathError> {
    let mut reader = Reader::from_str(fragment);
    let mut stack: Vec<Open> = Vec::new();
    let mut top: Vec<MathNode> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MathError::Malformed(e.to_string()))?;
        match event {
            Event::Start(e) => stack.push(Open {
                name: local_name(e.name().as_ref()),
                attrs: read_attrs(&e),
                children: Vec::new(),
            }),
            Event::Empty(e) => {
                let node = MathNode::Element {
                    name: local_name(e.name().as_ref()),
                    attrs: read_attrs(&e),
                    children: Vec::new(),
                };
                push_child(&mut stack, &mut top, node);
            }
            Event::End(e) => {
                let name = local_name(e.name().as_ref());
                let open = stack
                    .pop()
                    .filter(|open| open.name == name)
                    .ok_or_else(|| MathError::Unbalanced(name.clone()))?;
                let node = MathNode::Element {
                    name: open.name,
                    attrs: open.attrs,
                    children: open.children,
                };
                push_child(&mut stack, &mut top, node);
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                push_text(&mut stack, &mut top, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                push_text(&mut stack, &mut top, &text);
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                let resolved = resolve_entity(&entity)
                    .ok_or_else(|| MathError::Malformed(format!("unknown entity &{};", entity)))?;
                push_text(&mut stack, &mut top, &resolved);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(MathError::Malformed(format!("unclosed <{}>", open.name)));
    }

    let mut elements = top
        .into_iter()
        .filter(|node| matches!(node, MathNode::Element { .. }));
    match (elements.next(), elements.next()) {
        (Some(only), None) => Ok(only),
        (Some(first), Some(second)) => Ok(MathNode::Element {
            name: "mrow".to_string(),
            attrs: Vec::new(),
            children: [first, second].into_iter().chain(elements).collect(),
        }),
        (None, _) => Err(MathError::Empty),
    }
}

fn push_child(stack: &mut [Open], top: &mut Vec<MathNode>, node: MathNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

fn push_text(stack: &mut [Open], top: &mut Vec<MathNode>, text: &str) {
    let children = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => top,
    };
    if let Some(MathNode::Text(existing)) = children.last_mut() {
        existing.push_str(text);
    } else {
        children.push(MathNode::Text(text.to_string()));
    }
}

fn read_attrs(e: &quick_xml::events::BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = quick_xml::escape::unescape(&raw)
                .map(Cow::into_owned)
                .unwrap_or(raw);
            (local_name(attr.key.as_ref()), value)
        })
        .collect()
}

fn local_name(name: &[u8]) -> String {
    let local = name
        .iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name);
    String::from_utf8_lossy(local).to_ascii_lowercase()
}

fn resolve_entity(entity: &str) -> Option<String> {
    let named = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{00A0}",
        _ => "",
    };
    if !named.is_empty() {
        return Some(named.to_string());
    }
    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse().ok()?
    };
    char::from_u32(code).map(String::from)
}

// ========== rendering ==========

impl MathNode {
    fn name(&self) -> Option<&str> {
        match self {
            MathNode::Element { name, .. } => Some(name),
            MathNode::Text(_) => None,
        }
    }

    fn attr(&self, key: &str) -> Option<&str> {
        match self {
            MathNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            MathNode::Text(_) => None,
        }
    }

    /// Element children, ignoring inter-element whitespace
    fn elements(&self) -> Vec<&MathNode> {
        match self {
            MathNode::Element { children, .. } => children
                .iter()
                .filter(|c| matches!(c, MathNode::Element { .. }))
                .collect(),
            MathNode::Text(_) => Vec::new(),
        }
    }

    fn text(&self) -> String {
        match self {
            MathNode::Text(text) => text.clone(),
            MathNode::Element { children, .. } => children.iter().map(MathNode::text).collect(),
        }
    }
}

fn render(node: &MathNode) -> String {
    let MathNode::Element { name, children, .. } = node else {
        return map_text(node.text().trim());
    };
    let args = node.elements();
    let arg = |i: usize| args.get(i).map(|n| render(n)).unwrap_or_default();

    match name.as_str() {
        "mi" => render_identifier(node),
        "mn" => node.text().trim().to_string(),
        "mo" => map_text(node.text().trim()),
        "mtext" | "ms" => {
            let text = node.text();
            if text.trim().is_empty() {
                " ".to_string()
            } else {
                format!(r"\text{{{}}}", escape_text(&text))
            }
        }
        "mspace" => r"\,".to_string(),
        "mfrac" => format!(r"\frac{{{}}}{{{}}}", arg(0), arg(1)),
        "msqrt" => format!(r"\sqrt{{{}}}", join(children.iter().map(render))),
        "mroot" => format!(r"\sqrt[{}]{{{}}}", arg(1), arg(0)),
        "msup" => format!("{}^{{{}}}", group(&arg(0)), arg(1)),
        "msub" => format!("{}_{{{}}}", group(&arg(0)), arg(1)),
        "msubsup" => format!("{}_{{{}}}^{{{}}}", group(&arg(0)), arg(1), arg(2)),
        "mover" => render_over(&arg(0), args.get(1).copied()),
        "munder" => render_under(&arg(0), args.get(1).copied()),
        "munderover" => {
            let base = arg(0);
            if is_large_operator(&base) {
                format!("{}_{{{}}}^{{{}}}", base, arg(1), arg(2))
            } else {
                format!(r"\underset{{{}}}{{\overset{{{}}}{{{}}}}}", arg(1), arg(2), base)
            }
        }
        "mfenced" => render_fenced(node, &args),
        "mtable" => render_table(&args),
        "mmultiscripts" => render_multiscripts(&args),
        "semantics" => arg(0),
        "annotation" | "annotation-xml" | "none" | "mprescripts" | "mphantom" => String::new(),
        _ => join(children.iter().map(render)),
    }
}

fn render_identifier(node: &MathNode) -> String {
    let text = node.text();
    let text = text.trim();
    if FUNCTIONS.contains(&text) {
        return format!(r"\{}", text);
    }
    let chars = text.chars().count();
    if chars > 1 && text.chars().all(|c| c.is_ascii_alphabetic()) {
        return format!(r"\mathrm{{{}}}", text);
    }
    let mapped = map_text(text);
    match node.attr("mathvariant") {
        Some("bold") if chars > 0 => format!(r"\mathbf{{{}}}", mapped),
        Some("normal") if chars == 1 && text.chars().all(|c| c.is_ascii_alphabetic()) => {
            format!(r"\mathrm{{{}}}", mapped)
        }
        _ => mapped,
    }
}

fn render_over(base: &str, script: Option<&MathNode>) -> String {
    let Some(script) = script else {
        return base.to_string();
    };
    if let Some(accent) = over_accent(&script.text()) {
        return format!("{}{{{}}}", accent, base);
    }
    let rendered = render(script);
    if is_large_operator(base) {
        format!("{}^{{{}}}", base, rendered)
    } else {
        format!(r"\overset{{{}}}{{{}}}", rendered, base)
    }
}

fn render_under(base: &str, script: Option<&MathNode>) -> String {
    let Some(script) = script else {
        return base.to_string();
    };
    let raw = script.text();
    if matches!(raw.trim(), "_" | "¯" | "‾" | "―") {
        return format!(r"\underline{{{}}}", base);
    }
    let rendered = render(script);
    if is_large_operator(base) {
        format!("{}_{{{}}}", base, rendered)
    } else {
        format!(r"\underset{{{}}}{{{}}}", rendered, base)
    }
}

fn render_fenced(node: &MathNode, args: &[&MathNode]) -> String {
    let open = node.attr("open").unwrap_or("(");
    let close = node.attr("close").unwrap_or(")");
    let separators: Vec<char> = node
        .attr("separators")
        .unwrap_or(",")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut inner = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            if let Some(sep) = separators.get(i - 1).or(separators.last()) {
                inner.push(*sep);
            }
        }
        inner.push_str(&render(arg));
    }
    format!(r"\left{} {} \right{}", delimiter(open), inner, delimiter(close))
}

fn delimiter(d: &str) -> String {
    match d.trim() {
        "" => ".".to_string(),
        "{" => r"\{".to_string(),
        "}" => r"\}".to_string(),
        "⟨" | "〈" => r"\langle".to_string(),
        "⟩" | "〉" => r"\rangle".to_string(),
        "|" | "∣" => "|".to_string(),
        "‖" | "∥" => r"\|".to_string(),
        other => other.to_string(),
    }
}

fn render_table(rows: &[&MathNode]) -> String {
    let body: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells = match row.name() {
                Some("mtr") | Some("mlabeledtr") => row.elements(),
                _ => vec![*row],
            };
            cells
                .iter()
                .map(|cell| render(cell))
                .collect::<Vec<_>>()
                .join(" & ")
        })
        .collect();
    format!(r"\begin{{matrix}} {} \end{{matrix}}", body.join(r" \\ "))
}

fn render_multiscripts(args: &[&MathNode]) -> String {
    let Some((base, rest)) = args.split_first() else {
        return String::new();
    };
    let split = rest
        .iter()
        .position(|n| n.name() == Some("mprescripts"))
        .unwrap_or(rest.len());
    let scripts = |nodes: &[&MathNode]| {
        nodes
            .chunks(2)
            .map(|pair| {
                let sub = pair.first().map(|n| render(n)).unwrap_or_default();
                let sup = pair.get(1).map(|n| render(n)).unwrap_or_default();
                format!("_{{{}}}^{{{}}}", sub, sup)
            })
            .collect::<String>()
    };
    let post = scripts(&rest[..split]);
    let pre = if split < rest.len() {
        format!("{{}}{}", scripts(&rest[split + 1..]))
    } else {
        String::new()
    };
    format!("{}{}{}", pre, group(&render(base)), post)
}

fn map_text(text: &str) -> String {
    join(text.chars().map(|c| match symbol(c) {
        Some(latex) => latex.to_string(),
        None => c.to_string(),
    }))
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' | '}' | '%' | '#' | '&' | '$' | '_' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Concatenates, separating a trailing control word from a following letter or digit
fn join(parts: impl Iterator<Item = String>) -> String {
    let mut out = String::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        if ends_with_control_word(&out) && part.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            out.push(' ');
        }
        out.push_str(&part);
    }
    out
}

fn ends_with_control_word(s: &str) -> bool {
    match s.rfind('\\') {
        Some(i) => {
            let word = &s[i + 1..];
            !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// Wraps a script base in braces unless it is one token or a run of digits
fn group(base: &str) -> String {
    let single = base.chars().count() == 1
        || base.chars().all(|c| c.is_ascii_digit())
        || (base.starts_with('\\') && base[1..].chars().all(|c| c.is_ascii_alphabetic()));
    if single || base.is_empty() {
        base.to_string()
    } else {
        format!("{{{}}}", base)
    }
}
