//! Token lists of the `class` attribute.

/// `existing` with each token of `add` appended unless already present
pub fn merge(existing: Option<&str>, add: &str) -> String {
    let mut tokens: Vec<&str> = existing.unwrap_or_default().split_whitespace().collect();
    for class in add.split_whitespace() {
        if !tokens.contains(&class) {
            tokens.push(class);
        }
    }
    tokens.join(" ")
}

/// Matching tokens in their original order; `None` when none remain
pub fn retain(existing: &str, mut keep: impl FnMut(&str) -> bool) -> Option<String> {
    let kept: Vec<&str> = existing.split_whitespace().filter(|c| keep(c)).collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}
