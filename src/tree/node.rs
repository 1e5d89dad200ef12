//! Workspace node types

use crate::types::{NodeId, Timestamp};
use serde::{Deserialize, Serialize};

/// Node kind: a file holds content, a folder holds children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// File or folder entry in the workspace tree.
///
/// `children_ids` is meaningful for folders only. Its order is insertion order and
/// is not the display order; see [`TreeState::list_children`](super::TreeState::list_children).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub children_ids: Vec<NodeId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Node {
    pub fn new_folder(id: NodeId, name: impl Into<String>, parent_id: Option<NodeId>, now: Timestamp) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::Folder,
            parent_id,
            children_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_file(id: NodeId, name: impl Into<String>, parent_id: NodeId, now: Timestamp) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::File,
            parent_id: Some(parent_id),
            children_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
