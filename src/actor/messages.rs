//! Actor Message Definitions
//!
//! ```text
//! DocWatcher ──ChangeEvent──► RecompileActor
//! (one per document)          (single consumer)
//! ```

use crate::core::DocPath;

/// A tracked document's size or mtime changed since its last observation.
///
/// Carries only the path: the recompile loop re-reads the document from
/// disk instead of trusting anything the watcher saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub doc: DocPath,
}

impl ChangeEvent {
    pub fn new(doc: DocPath) -> Self {
        Self { doc }
    }
}
