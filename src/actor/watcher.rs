//! Per-document change watcher.
//!
//! Each tracked document gets its own polling loop:
//!
//! ```text
//! observing(size, mtime) ──tick──► stat ──changed──► send ChangeEvent
//!          ▲                         │                      │
//!          └──── unchanged / error ──┘◄─────────────────────┘
//! ```
//!
//! A failed stat is logged and the previous observation kept. Rapid edits
//! inside one interval collapse into a single event.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::messages::ChangeEvent;
use crate::core::{DocPath, Shutdown, Snapshot};
use crate::{debug, log};

/// Pure change detection: no timing, no I/O.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<Snapshot>,
}

impl ChangeDetector {
    pub fn new(initial: Option<Snapshot>) -> Self {
        Self { last: initial }
    }

    /// Record `current`; true when it differs from the previous observation.
    ///
    /// With no previous observation (baseline stat failed) the first
    /// successful stat counts as a change.
    pub fn observe(&mut self, current: Snapshot) -> bool {
        let changed = self.last != Some(current);
        self.last = Some(current);
        changed
    }
}

/// Polls one document and reports changes on the shared channel.
pub struct DocWatcher {
    doc: DocPath,
    path: PathBuf,
    baseline: Option<Snapshot>,
    interval: Duration,
    tx: mpsc::Sender<ChangeEvent>,
    shutdown: Shutdown,
}

impl DocWatcher {
    pub fn new(
        doc: DocPath,
        path: PathBuf,
        baseline: Option<Snapshot>,
        interval: Duration,
        tx: mpsc::Sender<ChangeEvent>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            doc,
            path,
            baseline,
            interval,
            tx,
            shutdown,
        }
    }

    /// Run until shutdown fires or the recompile side goes away.
    ///
    /// The first poll compares against `baseline`, so a change made after
    /// the baseline was taken is reported on the first tick.
    pub async fn run(mut self) {
        let mut detector = ChangeDetector::new(self.baseline);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.fired() => break,
                _ = ticker.tick() => {}
            }

            let current = match Snapshot::read(&self.path) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    log!("watch"; "cannot stat {}: {}", self.doc, e);
                    continue;
                }
            };

            if !detector.observe(current) {
                continue;
            }

            debug!("watch"; "changed: {}", self.doc);
            let event = ChangeEvent::new(self.doc.clone());

            // A full channel blocks only this document's watcher
            tokio::select! {
                biased;
                _ = self.shutdown.fired() => break,
                sent = self.tx.send(event) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("watch"; "stopped: {}", self.doc);
    }
}
