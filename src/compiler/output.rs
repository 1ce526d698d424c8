//! Output root and artifact writing.
//!
//! The output root is a temporary directory removed when `OutputRoot` is
//! closed or dropped. Artifacts are written to a temporary sibling and
//! renamed into place, so the HTTP server never reads a half-written file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};

use super::template::Template;
use crate::config::WikiConfig;
use crate::core::DocPath;

/// Ephemeral directory holding every artifact.
#[derive(Debug)]
pub struct OutputRoot {
    dir: TempDir,
}

impl OutputRoot {
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("mdwiki-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failure instead of ignoring it.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Writes rendered documents to their mirrored location.
#[derive(Debug)]
pub struct OutputWriter {
    root: PathBuf,
    source_ext: String,
    output_ext: String,
    template: Option<Template>,
}

impl OutputWriter {
    pub fn new(config: &WikiConfig, root: &Path, template: Option<Template>) -> Self {
        Self {
            root: root.to_path_buf(),
            source_ext: config.convert.source_ext.clone(),
            output_ext: config.convert.output_ext.clone(),
            template,
        }
    }

    /// `<root>/a/b.html` for `a/b.md`.
    pub fn artifact_path(&self, doc: &DocPath) -> PathBuf {
        self.root
            .join(doc.artifact_relative(&self.source_ext, &self.output_ext))
    }

    /// Write (or replace) the artifact for `doc`, returning its path.
    ///
    /// Parent directories are created on demand; concurrent creation of the
    /// same directory by several writers is fine.
    pub fn write(&self, doc: &DocPath, rendered: &[u8]) -> io::Result<PathBuf> {
        let dest = self.artifact_path(doc);
        let parent = dest.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        match &self.template {
            Some(template) => tmp.write_all(&template.render(doc.title(), rendered))?,
            None => tmp.write_all(rendered)?,
        }
        tmp.flush()?;
        tmp.persist(&dest).map_err(|err| err.error)?;
        Ok(dest)
    }
}
