/// LaTeX for a single character that has no plain-text spelling
pub(super) fn symbol(c: char) -> Option<&'static str> {
    let latex = match c {
        // greek
        'α' => r"\alpha",
        'β' => r"\beta",
        'γ' => r"\gamma",
        'δ' => r"\delta",
        'ε' => r"\varepsilon",
        'ϵ' => r"\epsilon",
        'ζ' => r"\zeta",
        'η' => r"\eta",
        'θ' => r"\theta",
        'ϑ' => r"\vartheta",
        'ι' => r"\iota",
        'κ' => r"\kappa",
        'λ' => r"\lambda",
        '\u{03BC}' | '\u{00B5}' => r"\mu",
        'ν' => r"\nu",
        'ξ' => r"\xi",
        'π' => r"\pi",
        'ρ' => r"\rho",
        'σ' => r"\sigma",
        'ς' => r"\varsigma",
        'τ' => r"\tau",
        'υ' => r"\upsilon",
        '\u{03C6}' | '\u{03D5}' => r"\phi",
        'χ' => r"\chi",
        'ψ' => r"\psi",
        'ω' => r"\omega",
        'Γ' => r"\Gamma",
        'Δ' => r"\Delta",
        'Θ' => r"\Theta",
        'Λ' => r"\Lambda",
        'Ξ' => r"\Xi",
        'Π' => r"\Pi",
        'Σ' => r"\Sigma",
        'Υ' => r"\Upsilon",
        'Φ' => r"\Phi",
        'Ψ' => r"\Psi",
        '\u{03A9}' | '\u{2126}' => r"\Omega",
        // operators and relations
        '×' => r"\times",
        '÷' => r"\div",
        '·' | '⋅' => r"\cdot",
        '±' => r"\pm",
        '∓' => r"\mp",
        '−' => "-",
        '≤' => r"\leq",
        '≥' => r"\geq",
        '≠' => r"\neq",
        '≈' => r"\approx",
        '≡' => r"\equiv",
        '∝' => r"\propto",
        '∼' => r"\sim",
        '≪' => r"\ll",
        '≫' => r"\gg",
        '→' => r"\rightarrow",
        '←' => r"\leftarrow",
        '↔' => r"\leftrightarrow",
        '⇒' => r"\Rightarrow",
        '⇔' => r"\Leftrightarrow",
        '⇌' => r"\rightleftharpoons",
        '∞' => r"\infty",
        '∂' => r"\partial",
        '∇' => r"\nabla",
        '∑' => r"\sum",
        '∏' => r"\prod",
        '∫' => r"\int",
        '∬' => r"\iint",
        '∮' => r"\oint",
        '√' => r"\surd",
        '∈' => r"\in",
        '∉' => r"\notin",
        '⊂' => r"\subset",
        '⊆' => r"\subseteq",
        '∪' => r"\cup",
        '∩' => r"\cap",
        '∅' => r"\emptyset",
        '∀' => r"\forall",
        '∃' => r"\exists",
        '¬' => r"\neg",
        '∧' => r"\wedge",
        '∨' => r"\vee",
        '°' => r"^{\circ}",
        '′' => "'",
        '″' => "''",
        '…' => r"\ldots",
        '⋯' => r"\cdots",
        'ℏ' => r"\hbar",
        '⟨' | '〈' => r"\langle",
        '⟩' | '〉' => r"\rangle",
        '∥' => r"\parallel",
        '⊥' => r"\perp",
        '∠' => r"\angle",
        '△' => r"\triangle",
        // escapes
        '{' => r"\{",
        '}' => r"\}",
        '%' => r"\%",
        '#' => r"\#",
        '&' => r"\&",
        '$' => r"\$",
        '_' => r"\_",
        // spacing and invisible operators
        '\u{00A0}' => "~",
        '\u{2009}' | '\u{200A}' => r"\,",
        '\u{2061}' | '\u{2062}' | '\u{2063}' | '\u{2064}' | '\u{200B}' => "",
        _ => return None,
    };
    Some(latex)
}

/// Identifiers rendered as upright operator names
pub(super) const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "sinh", "cosh", "tanh", "coth", "arcsin",
    "arccos", "arctan", "log", "ln", "lg", "exp", "lim", "max", "min", "det", "sup", "inf",
    "gcd", "deg", "arg", "dim", "ker", "Pr",
];

/// Operators whose under/over scripts are limits
pub(super) fn is_large_operator(latex: &str) -> bool {
    matches!(
        latex,
        r"\sum" | r"\prod" | r"\int" | r"\iint" | r"\oint" | r"\lim" | r"\max" | r"\min"
    )
}

/// Accent command for an over-script character
pub(super) fn over_accent(script: &str) -> Option<&'static str> {
    let accent = match script.trim() {
        "¯" | "‾" | "―" | "-" | "−" | "_" => r"\overline",
        "^" | "ˆ" | "\u{0302}" => r"\hat",
        "→" | "\u{20D7}" | r"\rightarrow" => r"\vec",
        "~" | "˜" | "\u{0303}" => r"\tilde",
        "˙" | "." | "\u{0307}" => r"\dot",
        "¨" | "\u{0308}" => r"\ddot",
        _ => return None,
    };
    Some(accent)
}
