//! Core types shared across the codebase.

mod document;
mod error;
mod state;

pub use document::{DocPath, Snapshot, Tracked};
pub use error::StartupError;
pub use state::{
    LifecycleEvent, LifecycleTx, Shutdown, lifecycle_channel, setup_interrupt_handler,
};
