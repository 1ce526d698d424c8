//! Tracked documents: identity and on-disk observation.

use std::fmt;
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Source-relative, slash-separated document path.
///
/// Stable for the whole run; the only identity a document has.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl DocPath {
    /// Build from an absolute (or root-prefixed) source path.
    ///
    /// Returns `None` when `path` is not below `root` or contains
    /// non-UTF-8 / parent components.
    pub fn from_source(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        Self::from_relative(relative)
    }

    /// Build from a path already relative to the source root.
    pub fn from_relative(relative: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of the document under `root`.
    pub fn source_path(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }

    /// Relative artifact path: same directories, extension swapped.
    ///
    /// Only a trailing `.{source_ext}` is stripped; `notes.v2.md` becomes
    /// `notes.v2.html`.
    pub fn artifact_relative(&self, source_ext: &str, output_ext: &str) -> PathBuf {
        let suffix = format!(".{source_ext}");
        let stem = self.0.strip_suffix(&suffix).unwrap_or(&self.0);
        let with_ext = format!("{stem}.{output_ext}");
        with_ext.split('/').collect()
    }

    /// File stem, used as the page title when a template is applied.
    pub fn title(&self) -> &str {
        let name = self.0.rsplit('/').next().unwrap_or(&self.0);
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document picked up by the bulk build.
///
/// `baseline` is the snapshot read just before its first conversion, so
/// an edit racing that conversion still shows up as a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked {
    pub doc: DocPath,
    /// `None` if the stat failed; the first successful poll then counts
    pub baseline: Option<Snapshot>,
}

/// Last observed size and modification time of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub size: u64,
    /// `None` on platforms without mtime support
    pub modified: Option<SystemTime>,
}

impl Snapshot {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
        }
    }

    pub fn read(path: &Path) -> std::io::Result<Self> {
        std::fs::metadata(path).map(|meta| Self::from_metadata(&meta))
    }
}
