//! mdwiki - serve a directory of markdown notes as a live-updating HTML wiki.

mod actor;
mod cli;
mod compiler;
mod config;
mod core;
mod logger;
mod utils;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{ColorChoice, Parser};

use crate::cli::Cli;
use crate::config::WikiConfig;
use crate::core::StartupError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<(), StartupError> {
    let config = WikiConfig::load(cli)?;
    cli::serve::serve_wiki(Arc::new(config))
}

/// One diagnostic: the error and its causes on indented lines.
fn report(error: &StartupError) {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    log!("error"; "{}", message);
}
