//! Startup-fatal errors and their process exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort the whole process.
///
/// Each maps to an exit code so scripts can tell a typo in the source
/// directory apart from a missing converter.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("source directory `{0}` does not exist")]
    SourceMissing(PathBuf),

    #[error("converter `{program}` not found on PATH")]
    ConverterMissing {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StartupError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::SourceMissing(_) => 2,
            Self::ConverterMissing { .. } => 3,
            Self::Config(_) | Self::Other(_) => 1,
        }
    }
}
