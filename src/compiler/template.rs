//! Page template: wraps rendered markup in a full HTML document.
//!
//! ```html
//! <html><head><title>{{title}}</title></head><body>{{content}}</body></html>
//! ```
//!
//! Substitution is a single pass over the template, so placeholder text
//! that appears inside the rendered content is left alone.

use std::path::Path;

use anyhow::{Context, Result};

use crate::utils::html::escape;

const TITLE: &str = "{{title}}";
const CONTENT: &str = "{{content}}";

#[derive(Debug)]
enum Part {
    Literal(String),
    Title,
    Content,
}

#[derive(Debug)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template `{}`", path.display()))?;
        Ok(Self::parse(&source))
    }

    pub fn parse(source: &str) -> Self {
        let mut parts = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            let tail = &rest[start..];
            let (part, len) = if tail.starts_with(TITLE) {
                (Part::Title, TITLE.len())
            } else if tail.starts_with(CONTENT) {
                (Part::Content, CONTENT.len())
            } else {
                // Not a placeholder: keep `{{` as text
                push_literal(&mut parts, &rest[..start + 2]);
                rest = &rest[start + 2..];
                continue;
            };
            push_literal(&mut parts, &rest[..start]);
            parts.push(part);
            rest = &rest[start + len..];
        }
        push_literal(&mut parts, rest);

        Self { parts }
    }

    /// Render a page. The title is HTML-escaped; content is inserted as-is.
    pub fn render(&self, title: &str, content: &[u8]) -> Vec<u8> {
        let title = escape(title);
        let mut page = Vec::with_capacity(content.len() + 256);
        for part in &self.parts {
            match part {
                Part::Literal(text) => page.extend_from_slice(text.as_bytes()),
                Part::Title => page.extend_from_slice(title.as_bytes()),
                Part::Content => page.extend_from_slice(content),
            }
        }
        page
    }
}

fn push_literal(parts: &mut Vec<Part>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Part::Literal(prev)) = parts.last_mut() {
        prev.push_str(text);
    } else {
        parts.push(Part::Literal(text.to_string()));
    }
}
