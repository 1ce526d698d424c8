//! Actor Coordinator - wires up watchers and the recompile loop
//!
//! The coordinator is a thin orchestrator:
//! - creates the shared change channel
//! - spawns one `DocWatcher` per tracked document
//! - spawns the single `RecompileActor`
//! - waits for the shutdown token, then drains everything

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::messages::ChangeEvent;
use super::recompile::{RecompileActor, RecompileStats};
use super::watcher::DocWatcher;
use crate::compiler::Compiler;
use crate::config::WikiConfig;
use crate::core::{LifecycleTx, Shutdown, Tracked};
use crate::utils::plural_count;
use crate::{debug, log};

/// How long the recompile loop may take to finish an in-flight document.
const RECOMPILE_DRAIN: Duration = Duration::from_millis(500);

pub struct Coordinator {
    config: Arc<WikiConfig>,
    compiler: Arc<Compiler>,
    documents: Vec<Tracked>,
    shutdown: Shutdown,
}

impl Coordinator {
    pub fn new(
        config: Arc<WikiConfig>,
        compiler: Arc<Compiler>,
        documents: Vec<Tracked>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            config,
            compiler,
            documents,
            shutdown,
        }
    }

    /// Run the actor system until the shutdown token fires.
    pub async fn run(self) -> RecompileStats {
        let (tx, rx) = mpsc::channel::<ChangeEvent>(self.config.watch.channel_capacity);

        let recompile = RecompileActor::new(rx, self.compiler, self.shutdown.clone());
        let recompile_handle = tokio::spawn(recompile.run());

        let interval = self.config.watch.interval();
        let mut watchers = JoinSet::new();
        for Tracked { doc, baseline } in self.documents {
            let path = doc.source_path(&self.config.source);
            let watcher = DocWatcher::new(
                doc,
                path,
                baseline,
                interval,
                tx.clone(),
                self.shutdown.clone(),
            );
            watchers.spawn(watcher.run());
        }
        // Watchers hold the only senders now
        drop(tx);

        log!("watch"; "watching {} every {:?}", plural_count(watchers.len(), "document"), interval);

        let mut shutdown = self.shutdown;
        shutdown.fired().await;

        while watchers.join_next().await.is_some() {}

        let stats = match tokio::time::timeout(RECOMPILE_DRAIN, recompile_handle).await {
            Ok(Ok(stats)) => stats,
            _ => RecompileStats::default(),
        };
        debug!("actor"; "stopped");
        stats
    }
}

/// Start the actor system on its own thread with a tokio runtime.
///
/// Runtime construction failure is reported to the lifecycle controller
/// as fatal rather than exiting from here.
pub fn spawn_actors(
    config: Arc<WikiConfig>,
    compiler: Arc<Compiler>,
    documents: Vec<Tracked>,
    shutdown: Shutdown,
    lifecycle: LifecycleTx,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let rt = match build_runtime() {
            Ok(rt) => rt,
            Err(e) => {
                lifecycle.fatal(e);
                return;
            }
        };
        rt.block_on(Coordinator::new(config, compiler, documents, shutdown).run());
    })
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("mdwiki-watch")
        .enable_time()
        .build()
        .context("failed to create tokio runtime")
}

/// Wait for the actor thread to finish (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    debug!("actor"; "did not stop in time");
}
