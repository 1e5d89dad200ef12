//! TreeState and its pure mutation algorithms.
//!
//! Every mutation borrows the current tree and returns a new one; the receiver is
//! never modified, so a failed operation leaves the caller's copy exactly as it was.

use super::node::{Node, NodeKind};
use super::traversal;
use crate::error::TreeError;
use crate::types::{new_id, NodeId, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Well-known id of the workspace root folder
pub const ROOT_ID: &str = "root";

/// Display name given to the root of a freshly seeded workspace
pub const DEFAULT_ROOT_NAME: &str = "Markdesk";

/// Name of the seed file written on first run
pub const SEED_FILE_NAME: &str = "README.md";

/// Complete snapshot of the folder/file hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeState {
    pub root_id: NodeId,
    pub nodes: BTreeMap<NodeId, Node>,
}

impl TreeState {
    /// Tree holding only a root folder.
    pub fn with_root(root_name: &str, now: Timestamp) -> Self {
        let root = Node::new_folder(ROOT_ID.to_string(), root_name, None, now);
        let mut nodes = BTreeMap::new();
        nodes.insert(root.id.clone(), root);
        Self {
            root_id: ROOT_ID.to_string(),
            nodes,
        }
    }

    /// First-run tree: a root folder with a single seed file. Returns the seed file id.
    pub fn seeded(now: Timestamp) -> (Self, NodeId) {
        let tree = Self::with_root(DEFAULT_ROOT_NAME, now);
        let readme_id = new_id();
        let next = tree
            .insert_child(ROOT_ID, readme_id.clone(), SEED_FILE_NAME, NodeKind::File, now)
            .map(|(next, _)| next)
            .unwrap_or(tree);
        (next, readme_id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node, failing with `NotFound`.
    pub fn node(&self, id: &str) -> Result<&Node, TreeError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::NotFound(id.to_string()))
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&self.root_id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_file(&self, id: &str) -> bool {
        self.nodes.get(id).map(Node::is_file).unwrap_or(false)
    }

    pub fn is_folder(&self, id: &str) -> bool {
        self.nodes.get(id).map(Node::is_folder).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every file node, in id order.
    pub fn file_ids(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.is_file())
            .map(|n| n.id.clone())
            .collect()
    }

    /// Create a folder under `parent_id`. Fails with `InvalidParent` unless the parent
    /// resolves to a folder.
    pub fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
        now: Timestamp,
    ) -> Result<(TreeState, NodeId), TreeError> {
        self.insert_child(parent_id, new_id(), name, NodeKind::Folder, now)
    }

    /// Create a file under `parent_id`. Same contract as [`create_folder`](Self::create_folder).
    pub fn create_file(
        &self,
        parent_id: &str,
        name: &str,
        now: Timestamp,
    ) -> Result<(TreeState, NodeId), TreeError> {
        self.insert_child(parent_id, new_id(), name, NodeKind::File, now)
    }

    pub(crate) fn insert_child(
        &self,
        parent_id: &str,
        id: NodeId,
        name: &str,
        kind: NodeKind,
        now: Timestamp,
    ) -> Result<(TreeState, NodeId), TreeError> {
        let parent = match self.nodes.get(parent_id) {
            Some(parent) if parent.is_folder() => parent,
            _ => return Err(TreeError::InvalidParent(parent_id.to_string())),
        };

        let node = match kind {
            NodeKind::Folder => Node::new_folder(id.clone(), name, Some(parent.id.clone()), now),
            NodeKind::File => Node::new_file(id.clone(), name, parent.id.clone(), now),
        };

        let mut parent = parent.clone();
        parent.children_ids.push(id.clone());
        parent.updated_at = now;

        let mut next = self.clone();
        next.nodes.insert(parent.id.clone(), parent);
        next.nodes.insert(id.clone(), node);
        Ok((next, id))
    }

    /// Rename a node. Sibling-name uniqueness is the caller's policy, not enforced here.
    pub fn rename_node(
        &self,
        id: &str,
        new_name: &str,
        now: Timestamp,
    ) -> Result<TreeState, TreeError> {
        let mut node = self.node(id)?.clone();
        node.name = new_name.to_string();
        node.updated_at = now;

        let mut next = self.clone();
        next.nodes.insert(node.id.clone(), node);
        Ok(next)
    }

    /// Delete a node and its whole subtree.
    ///
    /// Returns the new tree and every removed id (pre-order, starting with `id`), so the
    /// caller can purge content records and check whether the open file went with it.
    pub fn delete_node(
        &self,
        id: &str,
        now: Timestamp,
    ) -> Result<(TreeState, Vec<NodeId>), TreeError> {
        let node = self.node(id)?;
        let parent_id = node.parent_id.as_ref().ok_or(TreeError::CannotDeleteRoot)?;

        let deleted = traversal::collect_subtree_ids(self, id);
        let mut next = self.clone();
        for removed in &deleted {
            next.nodes.remove(removed);
        }

        if let Some(parent) = next.nodes.get_mut(parent_id) {
            parent.children_ids.retain(|child| child != id);
            parent.updated_at = now;
        }

        Ok((next, deleted))
    }

    /// Move a node under another folder.
    ///
    /// Fails with `CannotMoveRoot`, `InvalidDestination` when the target is not a folder,
    /// or `CyclicMove` when the target is the node itself or one of its descendants.
    pub fn move_node(
        &self,
        id: &str,
        dest_folder_id: &str,
        now: Timestamp,
    ) -> Result<TreeState, TreeError> {
        let node = self.node(id)?;
        let from_parent_id = node.parent_id.clone().ok_or(TreeError::CannotMoveRoot)?;

        match self.nodes.get(dest_folder_id) {
            Some(dest) if dest.is_folder() => {}
            _ => return Err(TreeError::InvalidDestination(dest_folder_id.to_string())),
        }

        let subtree: HashSet<NodeId> = traversal::collect_subtree_ids(self, id)
            .into_iter()
            .collect();
        if subtree.contains(dest_folder_id) {
            return Err(TreeError::CyclicMove {
                node: id.to_string(),
                destination: dest_folder_id.to_string(),
            });
        }

        let mut next = self.clone();
        if let Some(from_parent) = next.nodes.get_mut(&from_parent_id) {
            from_parent.children_ids.retain(|child| child != id);
            from_parent.updated_at = now;
        }
        if let Some(dest) = next.nodes.get_mut(dest_folder_id) {
            dest.children_ids.push(id.to_string());
            dest.updated_at = now;
        }
        if let Some(moved) = next.nodes.get_mut(id) {
            moved.parent_id = Some(dest_folder_id.to_string());
            moved.updated_at = now;
        }
        Ok(next)
    }

    /// Children of a folder in display order: folders before files, then by name.
    ///
    /// Dangling child ids are skipped. A file has no children.
    pub fn list_children(&self, folder_id: &str) -> Result<Vec<&Node>, TreeError> {
        let folder = self.node(folder_id)?;
        if folder.is_file() {
            return Ok(Vec::new());
        }
        let mut children: Vec<&Node> = folder
            .children_ids
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .collect();
        children.sort_by(|a, b| display_order(a, b));
        Ok(children)
    }

    /// Folder ids from the root down to the node.
    ///
    /// A file starts from its parent folder; a folder includes itself. Unknown ids yield
    /// an empty list, and a cyclic parent chain stops at the first repeated id.
    pub fn ancestor_folder_ids(&self, node_id: &str) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();

        let mut current = match self.nodes.get(node_id) {
            Some(node) if node.is_file() => node
                .parent_id
                .as_ref()
                .and_then(|parent| self.nodes.get(parent)),
            other => other,
        };

        while let Some(node) = current {
            if !node.is_folder() || !seen.insert(node.id.clone()) {
                break;
            }
            result.push(node.id.clone());
            current = node
                .parent_id
                .as_ref()
                .and_then(|parent| self.nodes.get(parent));
        }

        result.reverse();
        result
    }

    /// Folder that a "new file/folder" action should target given the current selection.
    pub fn resolve_parent_folder_id(&self, selected_id: Option<&str>) -> NodeId {
        let selected = match selected_id.and_then(|id| self.nodes.get(id)) {
            Some(node) => node,
            None => return self.root_id.clone(),
        };
        if selected.is_folder() {
            return selected.id.clone();
        }
        selected
            .parent_id
            .clone()
            .unwrap_or_else(|| self.root_id.clone())
    }

    /// File ids in the subtree rooted at `id` (including `id` itself when it is a file).
    pub fn collect_subtree_file_ids(&self, id: &str) -> Result<Vec<NodeId>, TreeError> {
        self.node(id)?;
        Ok(traversal::collect_subtree_ids(self, id)
            .into_iter()
            .filter(|nid| self.is_file(nid))
            .collect())
    }
}

fn display_order(a: &Node, b: &Node) -> Ordering {
    match (a.kind, b.kind) {
        (NodeKind::Folder, NodeKind::File) => Ordering::Less,
        (NodeKind::File, NodeKind::Folder) => Ordering::Greater,
        _ => a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)),
    }
}
