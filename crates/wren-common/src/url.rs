//! URL resolution utilities.
//!
//! Subresource references (`img[src]`, `link[href]`, `script[src]`) are
//! resolved against the document's base URL before being handed to the
//! network workers.

/// Resolve a potentially relative URL against a base URL.
///
/// Absolute URLs (`http:`, `https:`, `data:`, `file:`) pass through
/// unchanged. Otherwise protocol-relative (`//host/...`), absolute-path
/// (`/path`) and relative-path references are joined against `base_url`.
/// With no base, the reference is returned as-is.
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    if href.starts_with("http://")
        || href.starts_with("https://")
        || href.starts_with("data:")
        || href.starts_with("file:")
    {
        return href.to_string();
    }

    let Some(base) = base_url else {
        return href.to_string();
    };

    if let Some(rest) = href.strip_prefix("//") {
        // Protocol-relative: take the scheme from the base.
        if base.starts_with("https:") {
            format!("https://{rest}")
        } else {
            format!("http://{rest}")
        }
    } else if href.starts_with('/') {
        // Absolute path: join with the base's origin.
        base.find("://").map_or_else(
            || href.to_string(),
            |scheme_end| {
                let after_scheme = &base[scheme_end + 3..];
                after_scheme.find('/').map_or_else(
                    || format!("{base}{href}"),
                    |path_start| {
                        let origin = &base[..scheme_end + 3 + path_start];
                        format!("{origin}{href}")
                    },
                )
            },
        )
    } else {
        // Relative path: join with the base's directory.
        let base_dir = base.rsplit_once('/').map_or(base, |(dir, _)| dir);
        format!("{base_dir}/{href}")
    }
}
