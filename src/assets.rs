//! Asset references embedded in note text.
//!
//! Binary attachments are never inlined. Text refers to them with
//! `markdesk://asset/<id>`, resolved lazily by the renderer or exporter.

use crate::types::AssetId;
use std::collections::HashSet;

pub const ASSET_URI_PREFIX: &str = "markdesk://asset/";

/// Mime type assumed when a pasted blob carries none
pub const DEFAULT_ASSET_MIME: &str = "image/png";

pub fn asset_uri(id: &str) -> String {
    format!("{}{}", ASSET_URI_PREFIX, id)
}

pub fn is_asset_uri(uri: &str) -> bool {
    uri.starts_with(ASSET_URI_PREFIX)
}

/// Asset id named by a URI; `None` for other schemes or an empty id.
pub fn parse_asset_id(uri: &str) -> Option<&str> {
    let id = uri.strip_prefix(ASSET_URI_PREFIX)?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Markdown image snippet inserted at the cursor after a paste.
pub fn image_snippet(id: &str) -> String {
    format!("![pasted-image]({})", asset_uri(id))
}

/// Distinct asset ids referenced anywhere in `text`, in order of first appearance.
pub fn find_asset_refs(text: &str) -> Vec<AssetId> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    let mut rest = text;

    while let Some(pos) = rest.find(ASSET_URI_PREFIX) {
        let after = &rest[pos + ASSET_URI_PREFIX.len()..];
        let end = after
            .find(|c: char| c.is_whitespace() || matches!(c, ')' | '(' | '"' | '\'' | '<' | '>' | ']' | '['))
            .unwrap_or(after.len());
        let id = &after[..end];
        if !id.is_empty() && seen.insert(id) {
            refs.push(id.to_string());
        }
        rest = &after[end..];
    }

    refs
}
