//! Wiki configuration.
//!
//! Built once at startup from defaults, an optional `mdwiki.toml` and CLI
//! flags (in that order of precedence), then shared read-only behind an
//! `Arc` with every component.
//!
//! | Section     | Purpose                                         |
//! |-------------|-------------------------------------------------|
//! | `[convert]` | Converter command, extensions, page template    |
//! | `[serve]`   | HTTP interface and port                         |
//! | `[watch]`   | Poll interval and change channel capacity       |

mod error;
mod section;

pub use error::ConfigError;
pub use section::{ConvertConfig, ServeConfig, WatchConfig};

use crate::{cli::Cli, utils::path::normalize_path};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up in the source directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "mdwiki.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WikiConfig {
    /// Absolute source directory (internal use only)
    #[serde(skip)]
    pub source: PathBuf,

    /// Config file the values were read from, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub convert: ConvertConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl WikiConfig {
    /// Resolve the full configuration for one run.
    ///
    /// Does not check that the source directory exists; that is a
    /// lifecycle decision with its own exit code.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let source = normalize_path(&cli.source);
        let config_path = cli.config.as_deref().map(normalize_path).or_else(|| {
            let candidate = source.join(DEFAULT_CONFIG_FILE);
            candidate.is_file().then_some(candidate)
        });

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        config.source = source;
        config.config_path = config_path;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))
    }

    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.serve.interface, cli.interface.as_ref());
        Self::update_option(&mut self.serve.port, cli.port.as_ref());
        Self::update_option(&mut self.convert.command, cli.converter.as_ref());
        Self::update_option(&mut self.watch.interval_ms, cli.interval.as_ref());
        if let Some(template) = &cli.template {
            // CLI paths are relative to the working directory, not the source
            self.convert.template = Some(normalize_path(template));
        }
    }

    fn update_option<T: Clone>(target: &mut T, value: Option<&T>) {
        if let Some(v) = value {
            *target = v.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.convert.validate()?;
        self.watch.validate()
    }

    /// Template location, resolved against the source directory.
    pub fn template_path(&self) -> Option<PathBuf> {
        self.convert
            .template
            .as_ref()
            .map(|path| if path.is_absolute() { path.clone() } else { self.source.join(path) })
    }
}
