//! Generated index for directories without `index.html`.

use std::fs;
use std::io;
use std::path::Path;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::utils::html::escape;

/// Render a plain HTML list of `dir`'s entries, sorted by name.
///
/// Subdirectories carry a trailing `/`. Links are relative, so the page
/// must be served from the directory's trailing-slash URL.
pub fn render_listing(dir: &Path) -> io::Result<String> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // Names that are not UTF-8 cannot be linked
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.file_type()?.is_dir();
        entries.push((name, is_dir));
    }
    entries.sort();

    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for (name, is_dir) in &entries {
        let slash = if *is_dir { "/" } else { "" };
        let href = utf8_percent_encode(name, NON_ALPHANUMERIC);
        html.push_str(&format!(
            "<a href=\"{href}{slash}\">{}{slash}</a>\n",
            escape(name)
        ));
    }
    html.push_str("</pre>\n");
    Ok(html)
}
