//! Shared helpers: process execution, HTML escaping, MIME detection, paths, wording.

pub mod exec;
pub mod html;
pub mod mime;
pub mod path;
mod plural;

pub use plural::plural_count;
