//! Error types for the tree model, the storage layer, and the workspace API.

use crate::types::NodeId;
use crate::writeback::WriteBackError;
use thiserror::Error;

/// Structural errors raised by tree mutations.
///
/// These are always caller-induced: a bad id or an invalid target. The tree the
/// operation was called on is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Parent must be a folder: {0}")]
    InvalidParent(NodeId),

    #[error("Destination must be a folder: {0}")]
    InvalidDestination(NodeId),

    #[error("Cannot move {node} into its own subtree ({destination})")]
    CyclicMove { node: NodeId, destination: NodeId },

    #[error("Cannot delete the root folder")]
    CannotDeleteRoot,

    #[error("Cannot move the root folder")]
    CannotMoveRoot,

    #[error("Not a file: {0}")]
    NotAFile(NodeId),
}

/// Storage backend errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Top-level error for workspace operations and tooling
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Disk write failed: {0}")]
    WriteBack(#[from] WriteBackError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
