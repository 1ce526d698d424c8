//! Server lifecycle management.
//!
//! ```text
//! locate converter ─► check source ─► output root ─► bulk build
//!      ─► serve + watch ─► wait(interrupt | fatal) ─► shutdown ─► cleanup
//! ```

use std::sync::Arc;

use crossbeam::channel::Receiver;

use super::bind_server;
use crate::actor::{spawn_actors, wait_for_shutdown};
use crate::compiler::{Compiler, ExternalConverter, OutputRoot, OutputWriter, Template, build_all};
use crate::config::WikiConfig;
use crate::core::{
    LifecycleEvent, LifecycleTx, Shutdown, StartupError, lifecycle_channel,
    setup_interrupt_handler,
};
use crate::utils::plural_count;
use crate::{debug, log};

/// Build the wiki, serve it and keep it fresh until interrupted.
///
/// Every fatal condition comes back as an error after the output root has
/// been removed; the caller only has to print it and exit.
pub fn serve_wiki(config: Arc<WikiConfig>) -> Result<(), StartupError> {
    let (lifecycle, events) = lifecycle_channel();
    setup_interrupt_handler(lifecycle.clone())?;
    run_wiki(config, lifecycle, events)
}

fn run_wiki(
    config: Arc<WikiConfig>,
    lifecycle: LifecycleTx,
    events: Receiver<LifecycleEvent>,
) -> Result<(), StartupError> {
    if let Some(path) = &config.config_path {
        debug!("config"; "loaded {}", path.display());
    }

    // Without a converter nothing can be built, whatever the source holds
    let converter = ExternalConverter::locate(&config)?;
    debug!("convert"; "using {}", converter.program().display());

    if !config.source.is_dir() {
        return Err(StartupError::SourceMissing(config.source.clone()));
    }

    let template = config.template_path().map(|path| Template::load(&path)).transpose()?;

    // Dropped (and removed) on every return below
    let output = OutputRoot::create().map_err(|e| {
        anyhow::Error::new(e).context("failed to create output directory")
    })?;
    debug!("serve"; "output root {}", output.path().display());

    let writer = OutputWriter::new(&config, output.path(), template);
    let compiler = Arc::new(Compiler::new(&config.source, Arc::new(converter), writer));

    let report = build_all(&config, &compiler)?;
    if report.is_clean() {
        log!("build"; "wiki built: {}", plural_count(report.converted, "document"));
    } else {
        log!(
            "build";
            "wiki built: {} converted, {} failed",
            report.converted,
            report.failed.len()
        );
    }

    let bound = bind_server(config.serve.addr())?;
    log!("serve"; "http://{}", bound.addr());
    let server = bound.spawn(output.path(), lifecycle.clone());

    let (trigger, shutdown) = Shutdown::new();
    let actors = spawn_actors(
        Arc::clone(&config),
        Arc::clone(&compiler),
        report.documents,
        shutdown,
        lifecycle,
    );

    // Every sender lives at least as long as this call, so recv only fails
    // if all of them were dropped, which is treated as an interrupt
    let event = events.recv().unwrap_or(LifecycleEvent::Interrupt);
    match &event {
        LifecycleEvent::Interrupt => log!("serve"; "shutting down"),
        LifecycleEvent::Fatal(_) => debug!("serve"; "fatal report, shutting down"),
    }

    trigger.fire();
    server.shutdown();
    wait_for_shutdown(actors);

    if let Err(e) = output.close() {
        log!("serve"; "failed to remove output directory: {}", e);
    }

    match event {
        LifecycleEvent::Interrupt => Ok(()),
        LifecycleEvent::Fatal(e) => Err(StartupError::Other(e)),
    }
}
