//! Markdesk: local-first Markdown workspace
//!
//! A file/folder tree kept as an immutable value, file contents and pasted assets in a
//! pluggable store, and debounced persistence of edits, layout, and disk write-back.

pub mod assets;
pub mod config;
pub mod error;
pub mod logging;
pub mod save;
pub mod settings;
pub mod shortcuts;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod workspace;
pub mod writeback;
