//! Integration tests for the Markdesk workspace

mod bootstrap;
mod cli_output;
mod debounce;
mod delete_cascade;
mod sled_persistence;
mod support;
mod tree_properties;
mod tree_scenarios;
mod workspace_ops;
