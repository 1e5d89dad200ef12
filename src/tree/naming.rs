//! Naming policy helpers.
//!
//! The tree model accepts any name. Callers that want unique sibling names or a
//! default extension compute them here before calling create/rename.

use super::state::TreeState;
use std::collections::HashSet;

/// Default extension for notes created or imported without one
pub const MARKDOWN_EXTENSION: &str = ".md";

/// `desired` if no sibling under `parent_id` uses it, otherwise `base (n)ext` with the
/// smallest free n starting at 1.
pub fn ensure_unique_child_name(tree: &TreeState, parent_id: &str, desired: &str) -> String {
    let parent = match tree.get(parent_id) {
        Some(parent) if parent.is_folder() => parent,
        _ => return desired.to_string(),
    };
    let existing: HashSet<&str> = parent
        .children_ids
        .iter()
        .filter_map(|id| tree.get(id))
        .map(|node| node.name.as_str())
        .collect();
    if !existing.contains(desired) {
        return desired.to_string();
    }

    let (base, ext) = split_extension(desired);
    let mut n = 1usize;
    loop {
        let candidate = format!("{} ({}){}", base, n, ext);
        if !existing.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

/// Append `ext` only when `name` has no extension at all.
pub fn ensure_extension(name: &str, ext: &str) -> String {
    if name.to_lowercase().ends_with(&ext.to_lowercase()) {
        return name.to_string();
    }
    if let Some((_, suffix)) = name.rsplit_once('.') {
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return name.to_string();
        }
    }
    format!("{}{}", name, ext)
}

/// Name shown to the user: strips `.markdown` or a short alphabetic extension.
/// Dotfiles such as `.env` are kept whole.
pub fn display_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Some(rest) = trimmed.strip_prefix('.') {
        if !rest.is_empty() && !rest.contains(['.', '/', '\\']) {
            return trimmed.to_string();
        }
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.ends_with(".markdown") {
        return trimmed[..trimmed.len() - ".markdown".len()].to_string();
    }

    if let Some((stem, suffix)) = trimmed.rsplit_once('.') {
        let len = suffix.chars().count();
        if (1..=5).contains(&len) && suffix.chars().all(|c| c.is_ascii_alphabetic()) {
            return stem.to_string();
        }
    }
    trimmed.to_string()
}

/// Whether a file picked from disk is imported as a note.
pub fn is_supported_import_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown") || lower.ends_with(".txt")
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}
