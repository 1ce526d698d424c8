//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// What a request URL maps to under the output root.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// Directory without `index.html`: list its entries
    Listing(PathBuf),
    /// Directory requested without a trailing slash: `Location` value
    Redirect(String),
}

/// Resolve a request URL to something under `root`.
///
/// `root` must already be canonical. A directory URL must end in `/`
/// (otherwise it redirects) and resolves to its `index.html` or, failing
/// that, a listing. Anything missing or outside the root is `None`.
pub fn resolve_path(url: &str, root: &Path) -> Option<Resolved> {
    let (raw_path, query) = split_url(url);
    let clean = normalize_url(raw_path)?;

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    // Symlinks and encoded separators are caught here
    let canonical = root.join(&clean).canonicalize().ok()?;
    if !canonical.starts_with(root) {
        return None;
    }

    if canonical.is_file() {
        return Some(Resolved::File(canonical));
    }

    if !canonical.is_dir() {
        return None;
    }

    if !raw_path.ends_with('/') {
        let location = match query {
            Some(query) => format!("{raw_path}/?{query}"),
            None => format!("{raw_path}/"),
        };
        return Some(Resolved::Redirect(location));
    }

    let index = canonical.join("index.html");
    if index.is_file() {
        return Some(Resolved::File(index));
    }
    Some(Resolved::Listing(canonical))
}

/// Split off the fragment and query: `(path, query)`.
fn split_url(url: &str) -> (&str, Option<&str>) {
    let url = url.split('#').next().unwrap_or(url);
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

/// Percent-decode and trim slashes.
///
/// Undecodable (non UTF-8) paths resolve to nothing.
fn normalize_url(path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').replace('\\', "/"))
}
