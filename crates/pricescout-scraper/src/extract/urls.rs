//! Relative-to-absolute URL resolution for scraped links and images.

/// Resolves `href` against a store origin (`scheme://host`, no trailing slash).
///
/// - absolute `http(s)://` URLs are returned unchanged
/// - scheme-relative `//host/path` becomes `https://host/path`
/// - root-relative `/path` becomes `origin/path`
/// - anything else becomes `origin/` + `href`
#[must_use]
pub fn resolve_url(origin: &str, href: &str) -> String {
    let href = href.trim();
    if has_http_scheme(href) {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}

fn has_http_scheme(href: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        href.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Resolves an image source, returning an empty string for missing or
/// inline `data:` images.
#[must_use]
pub fn resolve_image(origin: &str, src: Option<&str>) -> String {
    match src.map(str::trim) {
        Some(s) if !s.is_empty() && !s.starts_with("data:") => resolve_url(origin, s),
        _ => String::new(),
    }
}

/// First candidate URL of a `srcset` attribute value.
pub(super) fn first_srcset_url(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .find(|url| !url.is_empty())
}
