//! Recompile Actor - serialized reconversion of changed documents
//!
//! Exactly one instance runs. Each `ChangeEvent` is converted and written
//! before the next one is received, so the output root never has two
//! concurrent writers after the bulk build.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::ChangeEvent;
use crate::compiler::Compiler;
use crate::core::Shutdown;
use crate::logger::{status_error, status_success};
use crate::{debug, log};

/// Counters returned when the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecompileStats {
    pub rebuilt: usize,
    pub failed: usize,
}

pub struct RecompileActor {
    rx: mpsc::Receiver<ChangeEvent>,
    compiler: Arc<Compiler>,
    shutdown: Shutdown,
}

impl RecompileActor {
    pub fn new(rx: mpsc::Receiver<ChangeEvent>, compiler: Arc<Compiler>, shutdown: Shutdown) -> Self {
        Self {
            rx,
            compiler,
            shutdown,
        }
    }

    /// Main loop. Ends on shutdown or when every watcher has dropped its sender.
    pub async fn run(mut self) -> RecompileStats {
        let mut stats = RecompileStats::default();

        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.fired() => break,
                event = self.rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if self.recompile(event).await {
                stats.rebuilt += 1;
            } else {
                stats.failed += 1;
            }
        }

        debug!("recompile"; "stopped ({} rebuilt, {} failed)", stats.rebuilt, stats.failed);
        stats
    }

    /// Convert and write one document off the async workers, waiting for
    /// it to finish before returning.
    async fn recompile(&self, event: ChangeEvent) -> bool {
        let compiler = Arc::clone(&self.compiler);
        let doc = event.doc.clone();
        let result = tokio::task::spawn_blocking(move || compiler.compile(&doc)).await;

        match result {
            Ok(Ok(_)) => {
                status_success(&format!("rebuilt: {}", event.doc));
                true
            }
            Ok(Err(err)) => {
                status_error(&format!("failed: {}", event.doc), &err.detail());
                false
            }
            Err(join) => {
                log!("recompile"; "{} aborted: {}", event.doc, join);
                false
            }
        }
    }
}
