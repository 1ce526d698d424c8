//! Actor System for Live Updates
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! DocWatcher × N ──► mpsc (bounded) ──► RecompileActor ──► output root
//!  (poll stat)                          (convert + write, one at a time)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - `ChangeEvent`
//! - `watcher` - per-document polling loop
//! - `recompile` - serialized recompilation
//! - `coordinator` - wires up and runs actors on a tokio runtime

pub mod coordinator;
pub mod messages;
pub mod recompile;
pub mod watcher;

#[cfg(test)]
mod tests;

pub use coordinator::{spawn_actors, wait_for_shutdown};
