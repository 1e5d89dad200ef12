//! Structural consistency checks for a TreeState.
//!
//! Used by tests and by the `status` command to flag corrupted persisted trees.

use super::state::TreeState;
use crate::types::NodeId;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One violated tree invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IntegrityIssue {
    MissingRoot(NodeId),
    RootHasParent(NodeId),
    ExtraRoot(NodeId),
    DanglingChild { parent: NodeId, child: NodeId },
    ParentMismatch { parent: NodeId, child: NodeId },
    NotListedByParent { node: NodeId },
    FileHasChildren(NodeId),
    Unreachable(NodeId),
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::MissingRoot(id) => write!(f, "root node {} is missing", id),
            IntegrityIssue::RootHasParent(id) => write!(f, "root node {} has a parent", id),
            IntegrityIssue::ExtraRoot(id) => write!(f, "node {} has no parent but is not the root", id),
            IntegrityIssue::DanglingChild { parent, child } => {
                write!(f, "folder {} lists missing child {}", parent, child)
            }
            IntegrityIssue::ParentMismatch { parent, child } => {
                write!(f, "folder {} lists {} whose parent is different", parent, child)
            }
            IntegrityIssue::NotListedByParent { node } => {
                write!(f, "node {} is not listed by its parent", node)
            }
            IntegrityIssue::FileHasChildren(id) => write!(f, "file {} has children", id),
            IntegrityIssue::Unreachable(id) => write!(f, "node {} is unreachable from the root", id),
        }
    }
}

/// Collect every invariant violation. An empty result means the tree is consistent.
pub fn validate(tree: &TreeState) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    match tree.root() {
        None => {
            issues.push(IntegrityIssue::MissingRoot(tree.root_id.clone()));
            return issues;
        }
        Some(root) if root.parent_id.is_some() => {
            issues.push(IntegrityIssue::RootHasParent(root.id.clone()));
        }
        Some(_) => {}
    }

    for node in tree.nodes.values() {
        match &node.parent_id {
            None if node.id != tree.root_id => {
                issues.push(IntegrityIssue::ExtraRoot(node.id.clone()));
            }
            Some(parent_id) => {
                let listed = tree
                    .get(parent_id)
                    .map(|parent| parent.children_ids.contains(&node.id))
                    .unwrap_or(false);
                if !listed {
                    issues.push(IntegrityIssue::NotListedByParent {
                        node: node.id.clone(),
                    });
                }
            }
            None => {}
        }

        if node.is_file() && !node.children_ids.is_empty() {
            issues.push(IntegrityIssue::FileHasChildren(node.id.clone()));
        }

        for child_id in &node.children_ids {
            match tree.get(child_id) {
                None => issues.push(IntegrityIssue::DanglingChild {
                    parent: node.id.clone(),
                    child: child_id.clone(),
                }),
                Some(child) if child.parent_id.as_ref() != Some(&node.id) => {
                    issues.push(IntegrityIssue::ParentMismatch {
                        parent: node.id.clone(),
                        child: child_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    // Anything not reached from the root is either orphaned or part of a cycle.
    let mut reached = HashSet::new();
    let mut stack = vec![tree.root_id.as_str()];
    while let Some(current) = stack.pop() {
        if !reached.insert(current) {
            continue;
        }
        if let Some(node) = tree.get(current) {
            stack.extend(node.children_ids.iter().map(String::as_str));
        }
    }
    for id in tree.nodes.keys() {
        if !reached.contains(id.as_str()) {
            issues.push(IntegrityIssue::Unreachable(id.clone()));
        }
    }

    issues
}

/// Shorthand for `validate(tree).is_empty()`.
pub fn is_consistent(tree: &TreeState) -> bool {
    validate(tree).is_empty()
}
