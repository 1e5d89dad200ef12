//! Tree Model
//!
//! Pure, synchronous operations over the workspace's normalized node map. No I/O
//! and no hidden state: callers own the current [`TreeState`] and persist it.

pub mod integrity;
pub mod naming;
pub mod node;
pub mod state;
pub mod traversal;

pub use node::{Node, NodeKind};
pub use state::{TreeState, DEFAULT_ROOT_NAME, ROOT_ID, SEED_FILE_NAME};
