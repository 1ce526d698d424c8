//! `[convert]`, `[serve]` and `[watch]` sections.
//!
//! ```toml
//! [convert]
//! command = "md2html"         # Converter program (must be on PATH)
//! args = ["--github"]         # Flags placed before the document path
//! source_ext = "md"           # Tracked document extension
//! output_ext = "html"         # Artifact extension
//! skip_hidden = true          # Ignore dot-directories and dot-files
//! template = "page.html"      # Optional page template
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 1234
//!
//! [watch]
//! interval_ms = 1000          # Poll interval per document
//! channel_capacity = 64       # Pending change events before watchers block
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// External converter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    pub command: String,
    pub args: Vec<String>,
    pub source_ext: String,
    pub output_ext: String,
    /// Skip hidden (dot-prefixed) entries below the source root.
    pub skip_hidden: bool,
    /// Page template, relative to the source root unless absolute.
    pub template: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            command: "md2html".into(),
            args: vec!["--github".into()],
            source_ext: "md".into(),
            output_ext: "html".into(),
            skip_hidden: true,
            template: None,
        }
    }
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command.trim().is_empty() {
            return Err(ConfigError::validation("convert.command", "must not be empty"));
        }
        validate_ext("convert.source_ext", &self.source_ext)?;
        validate_ext("convert.output_ext", &self.output_ext)?;
        if self.source_ext == self.output_ext {
            return Err(ConfigError::validation(
                "convert.output_ext",
                format!("must differ from source_ext `{}`", self.source_ext),
            ));
        }
        Ok(())
    }
}

fn validate_ext(field: &'static str, ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() {
        return Err(ConfigError::validation(field, "must not be empty"));
    }
    if ext.contains(['.', '/', '\\']) {
        return Err(ConfigError::validation(
            field,
            format!("`{ext}` must be a bare extension without dots or slashes"),
        ));
    }
    Ok(())
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces
    pub interface: IpAddr,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 1234,
        }
    }
}

impl ServeConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.interface, self.port)
    }
}

/// Change watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub interval_ms: u64,
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            channel_capacity: 64,
        }
    }
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::validation("watch.interval_ms", "must be positive"));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::validation(
                "watch.channel_capacity",
                "must be positive",
            ));
        }
        Ok(())
    }
}
