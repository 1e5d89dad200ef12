//! Workspace domain: bootstrap, orchestration of tree and store operations, import,
//! and status formatting.

pub mod bootstrap;
mod facade;
pub mod format;
mod import;
pub mod types;

pub use bootstrap::{bootstrap, seed_text, FALLBACK_FILE_NAME};
pub use facade::{Workspace, WorkspaceOptions, DEFAULT_IMPORT_FOLDER_NAME};
pub use types::*;
