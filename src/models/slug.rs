/// ASCII slug: non-ASCII letters are transliterated, then every run of
/// other characters becomes a single `-`, with no hyphen at either end.
pub fn slugify(input: &str) -> String {
    ::slug::slugify(input)
}

/// Slug of the final non-empty path segment of `url`
pub fn slug_from_url(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(slugify)
        .unwrap_or_default()
}

/// Book slug: the path segment after `books`, else the last non-empty segment
pub fn book_slug_from_url(url: &str) -> String {
    let after_books = url::Url::parse(url).ok().and_then(|parsed| {
        let segments: Vec<String> = parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let index = segments.iter().position(|s| s == "books")?;
        segments.get(index + 1).map(|s| slugify(s))
    });
    match after_books {
        Some(slug) if !slug.is_empty() => slug,
        _ => slug_from_url(url),
    }
}
