//! Iterative traversals over a TreeState.
//!
//! Folder depth is user-controlled, so nothing here recurses. Every walk tracks
//! visited ids; a corrupted persisted tree must not loop forever.

use super::node::Node;
use super::state::TreeState;
use crate::types::NodeId;
use std::collections::{HashSet, VecDeque};

/// Pre-order ids of the subtree rooted at `id`, including `id` itself.
///
/// Child ids that do not resolve are skipped.
pub(crate) fn collect_subtree_ids(tree: &TreeState, id: &str) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![id.to_string()];

    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        let node = match tree.get(&current) {
            Some(node) => node,
            None => continue,
        };
        if node.is_folder() {
            for child in node.children_ids.iter().rev() {
                stack.push(child.clone());
            }
        }
        result.push(current);
    }

    result
}

/// First file found by a breadth-first walk from the root, in stored child order.
///
/// Only deterministic, not user-facing: used to pick a fallback file to open.
pub fn first_file_id(tree: &TreeState) -> Option<NodeId> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(tree.root_id.as_str());

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        let node = match tree.get(current) {
            Some(node) => node,
            None => continue,
        };
        if node.is_file() {
            return Some(node.id.clone());
        }
        queue.extend(node.children_ids.iter().map(String::as_str));
    }

    None
}

/// Resolve a slash-separated path of names, starting below the root.
///
/// An empty path (or `/`) resolves to the root. When siblings share a name the first
/// one in display order wins.
pub fn find_by_path<'a>(tree: &'a TreeState, path: &str) -> Option<&'a Node> {
    let mut current = tree.root()?;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = tree
            .list_children(&current.id)
            .ok()?
            .into_iter()
            .find(|child| child.name == segment)?;
    }
    Some(current)
}

/// Slash path of names from below the root down to `id`.
pub fn node_path(tree: &TreeState, id: &str) -> Option<String> {
    let node = tree.get(id)?;
    let mut segments = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(node);
    while let Some(n) = current {
        if n.is_root() || !seen.insert(n.id.as_str()) {
            break;
        }
        segments.push(n.name.as_str());
        current = n.parent_id.as_deref().and_then(|p| tree.get(p));
    }
    segments.reverse();
    Some(format!("/{}", segments.join("/")))
}
