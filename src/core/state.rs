//! Process lifecycle signals.
//!
//! Two channels, both owned by the lifecycle controller:
//! - `Shutdown` / `ShutdownTrigger`: fired once, observed by every watcher
//!   loop and the recompile loop
//! - `LifecycleEvent`: interrupt or fatal report sent *to* the controller,
//!   so termination and cleanup happen in one place

use crossbeam::channel::{self, Receiver, Sender};
use tokio::sync::watch;

/// Why the controller stops blocking.
#[derive(Debug)]
pub enum LifecycleEvent {
    /// Ctrl+C received
    Interrupt,
    /// A background component hit a condition the process cannot survive
    Fatal(anyhow::Error),
}

/// Sender half handed to background components and the Ctrl+C handler.
#[derive(Clone)]
pub struct LifecycleTx(Sender<LifecycleEvent>);

impl LifecycleTx {
    pub fn interrupt(&self) {
        let _ = self.0.send(LifecycleEvent::Interrupt);
    }

    pub fn fatal(&self, error: anyhow::Error) {
        let _ = self.0.send(LifecycleEvent::Fatal(error));
    }
}

pub fn lifecycle_channel() -> (LifecycleTx, Receiver<LifecycleEvent>) {
    let (tx, rx) = channel::unbounded();
    (LifecycleTx(tx), rx)
}

/// Install the Ctrl+C handler. Every interrupt is forwarded; the controller
/// acts on the first one.
pub fn setup_interrupt_handler(tx: LifecycleTx) -> anyhow::Result<()> {
    ctrlc::set_handler(move || tx.interrupt())
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

// =============================================================================
// Shutdown token
// =============================================================================

/// Fires the shutdown token. Dropping it also counts as shutdown.
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn fire(&self) {
        let _ = self.0.send(true);
    }
}

/// Cloneable cancellation token observed by long-running tasks.
#[derive(Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn new() -> (ShutdownTrigger, Self) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger(tx), Self(rx))
    }

    /// Resolve once the trigger fires or is dropped.
    pub async fn fired(&mut self) {
        let _ = self.0.wait_for(|fired| *fired).await;
    }
}
