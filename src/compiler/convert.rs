//! Converter gateway: one document path in, rendered bytes out.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::WikiConfig;
use crate::core::StartupError;
use crate::utils::exec::{Cmd, ExecError};

/// Conversion of a single source file.
///
/// Blocking. Callers that need concurrency run it on their own task or
/// thread.
pub trait Convert: Send + Sync {
    fn convert(&self, source: &Path) -> Result<Vec<u8>, ConvertError>;
}

#[derive(Debug, Error)]
#[error("cannot convert `{}`", path.display())]
pub struct ConvertError {
    pub path: PathBuf,
    #[source]
    pub source: ExecError,
}

impl ConvertError {
    /// Converter output explaining the failure (may be empty).
    pub fn diagnostic(&self) -> &str {
        self.source.diagnostic()
    }
}

/// Runs `<command> <args..> <path>` and returns its stdout.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    program: PathBuf,
    args: Vec<String>,
    cwd: PathBuf,
}

impl ExternalConverter {
    /// Resolve the configured command on `PATH`.
    ///
    /// Missing converter is startup-fatal with its own exit code.
    pub fn locate(config: &WikiConfig) -> Result<Self, StartupError> {
        let command = &config.convert.command;
        let program = which::which(command).map_err(|source| StartupError::ConverterMissing {
            program: command.clone(),
            source,
        })?;
        Ok(Self {
            program,
            args: config.convert.args.clone(),
            cwd: config.source.clone(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Convert for ExternalConverter {
    fn convert(&self, source: &Path) -> Result<Vec<u8>, ConvertError> {
        Cmd::new(&self.program)
            .args(&self.args)
            .arg(source)
            .cwd(&self.cwd)
            .run()
            .map(|output| output.stdout)
            .map_err(|err| ConvertError {
                path: source.to_path_buf(),
                source: err,
            })
    }
}
