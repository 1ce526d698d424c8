//! Document discovery and conversion.
//!
//! ```text
//! collect_documents ──► Compiler::compile (convert → template → write)
//!                        ▲                     ▲
//!                   bulk::build_all      actor::RecompileActor
//! ```

pub mod bulk;
mod convert;
mod output;
mod template;

pub use bulk::build_all;
pub use convert::{Convert, ConvertError, ExternalConverter};
pub use output::{OutputRoot, OutputWriter};
pub use template::Template;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use jwalk::WalkDir;
use thiserror::Error;

use crate::config::WikiConfig;
use crate::core::DocPath;

/// Failure to (re)build one document. Never fatal to the process.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("cannot write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Extra detail for the status block (converter stderr or io error).
    pub fn detail(&self) -> String {
        match self {
            Self::Convert(err) => err.diagnostic().to_string(),
            Self::Write { source, .. } => source.to_string(),
        }
    }
}

/// Converts one document and writes its artifact.
///
/// Shared by the bulk build and the recompile loop so both take exactly
/// the same path for a document.
pub struct Compiler {
    source: PathBuf,
    converter: Arc<dyn Convert>,
    writer: OutputWriter,
}

impl Compiler {
    pub fn new(source: &Path, converter: Arc<dyn Convert>, writer: OutputWriter) -> Self {
        Self {
            source: source.to_path_buf(),
            converter,
            writer,
        }
    }

    /// Re-read `doc` from disk, convert it and replace its artifact.
    ///
    /// On failure the previous artifact is left untouched.
    pub fn compile(&self, doc: &DocPath) -> Result<PathBuf, CompileError> {
        let rendered = self.converter.convert(&doc.source_path(&self.source))?;
        self.writer
            .write(doc, &rendered)
            .map_err(|source| CompileError::Write {
                path: self.writer.artifact_path(doc),
                source,
            })
    }
}

/// Walk the source tree once and return every tracked document, sorted.
///
/// Any walk error (unreadable root or subdirectory) is returned; the caller
/// treats it as fatal.
pub fn collect_documents(config: &WikiConfig) -> Result<Vec<DocPath>> {
    let root = &config.source;
    let ext = OsStr::new(&config.convert.source_ext);

    std::fs::read_dir(root)
        .with_context(|| format!("cannot read source directory `{}`", root.display()))?;

    let mut documents = Vec::new();
    for entry in WalkDir::new(root)
        .skip_hidden(config.convert.skip_hidden)
        .sort(true)
    {
        let entry = entry.with_context(|| format!("failed to walk `{}`", root.display()))?;
        let path = entry.path();
        if path.extension() != Some(ext) {
            continue;
        }
        // The walk does not follow links; a link counts if its target is a file
        let file_type = entry.file_type();
        let is_document = file_type.is_file()
            || (file_type.is_symlink() && std::fs::metadata(&path).is_ok_and(|m| m.is_file()));
        if !is_document {
            continue;
        }
        if let Some(doc) = DocPath::from_source(root, &path) {
            documents.push(doc);
        }
    }
    Ok(documents)
}
