//! Format workspace status, the tree, folder listings, and settings as text.

use super::types::{DeleteOutcome, SweepReport, WorkspaceStatus};
use crate::settings::Settings;
use crate::shortcuts::{self, SHORTCUT_DEFS};
use crate::tree::naming::display_name;
use crate::tree::{Node, TreeState};
use chrono::{TimeZone, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::collections::HashSet;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Format workspace status as human-readable text.
pub fn format_status_text(data: &WorkspaceStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Workspace Status")));
    out.push_str(&format!("  Data dir: {}\n", data.data_dir));
    out.push_str(&format!("  Root: {}\n", data.root_name));
    out.push_str(&format!(
        "  Nodes: {} folders, {} files\n",
        data.folders, data.files
    ));
    out.push_str(&format!(
        "  Open file: {}\n",
        data.current_file.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("  Linked to disk: {}\n", data.linked_files));
    out.push_str(&format!("  Assets: {}\n", data.assets));
    out.push_str(&format!("  Theme: {}, language: {}\n\n", data.theme, data.language));

    out.push_str(&format!("{}\n\n", format_section_heading("Integrity")));
    if data.integrity_issues.is_empty() {
        out.push_str(&format!("  {}\n", "ok".green()));
    } else {
        for issue in &data.integrity_issues {
            out.push_str(&format!("  {} {}\n", "!".red(), issue));
        }
    }
    out
}

/// Render the whole tree in display order, marking the open file.
pub fn format_tree_text(tree: &TreeState, current_file_id: Option<&str>) -> String {
    let mut out = String::new();
    let root = match tree.root() {
        Some(root) => root,
        None => return out,
    };
    out.push_str(&format!("{}\n", root.name.bold()));

    // (node, prefix for its children, is last sibling)
    let mut stack: Vec<(&Node, String, bool)> = Vec::new();
    let mut seen = HashSet::new();
    push_children(tree, root, String::new(), &mut stack);

    while let Some((node, prefix, last)) = stack.pop() {
        if !seen.insert(node.id.as_str()) {
            continue;
        }
        let branch = if last { "└── " } else { "├── " };
        let label = if node.is_folder() {
            format!("{}/", node.name.blue().bold())
        } else if Some(node.id.as_str()) == current_file_id {
            format!("{} {}", node.name.green(), "*".green())
        } else {
            node.name.clone()
        };
        out.push_str(&format!("{}{}{}\n", prefix, branch, label));

        if node.is_folder() {
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            push_children(tree, node, child_prefix, &mut stack);
        }
    }
    out
}

fn push_children<'a>(
    tree: &'a TreeState,
    folder: &Node,
    prefix: String,
    stack: &mut Vec<(&'a Node, String, bool)>,
) {
    let children = tree.list_children(&folder.id).unwrap_or_default();
    let count = children.len();
    for (i, child) in children.into_iter().enumerate().rev() {
        stack.push((child, prefix.clone(), i + 1 == count));
    }
}

/// Table of a folder's children in display order.
pub fn format_children_table(children: &[&Node]) -> String {
    if children.is_empty() {
        return "(empty)\n".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Type", "Id", "Updated"]);
    for node in children {
        let kind = if node.is_folder() { "folder" } else { "file" };
        table.add_row(vec![
            display_name(&node.name),
            kind.to_string(),
            node.id.clone(),
            format_timestamp(node.updated_at),
        ]);
    }
    format!("{}\n", table)
}

/// Settings summary plus the effective shortcut table.
pub fn format_settings_text(settings: &Settings) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Settings")));
    out.push_str(&format!("  Theme: {:?}\n", settings.theme_mode));
    out.push_str(&format!("  Language: {:?}\n", settings.language));
    out.push_str(&format!(
        "  Panes: {:.0} / {:.0} / {:.0}\n",
        settings.ui.left_width, settings.ui.center_width, settings.ui.right_width
    ));
    out.push_str(&format!(
        "  Export header: {}\n",
        yes_no(settings.export.include_header)
    ));
    out.push_str(&format!(
        "  Ignore frontmatter: {}\n\n",
        yes_no(settings.preview.ignore_frontmatter)
    ));

    out.push_str(&format!("{}\n\n", format_section_heading("Shortcuts")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Action", "Scope", "Binding", ""]);
    for def in SHORTCUT_DEFS {
        let binding = shortcuts::effective_binding(settings, def.id)
            .unwrap_or_else(|| "(disabled)".to_string());
        let marker = if settings.shortcuts.contains_key(def.id) {
            "custom"
        } else {
            ""
        };
        table.add_row(vec![
            def.id.to_string(),
            format!("{:?}", def.scope),
            binding,
            marker.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    let conflicts = shortcuts::conflicts(settings);
    for (a, b, binding) in conflicts {
        out.push_str(&format!(
            "  {} {} and {} share {}\n",
            "conflict:".yellow(),
            a,
            b,
            binding
        ));
    }
    out
}

pub fn format_delete_text(outcome: &DeleteOutcome) -> String {
    let mut out = format!(
        "Deleted {} node(s), purged {} file(s) and {} asset(s).\n",
        outcome.deleted_ids.len(),
        outcome.purged_files.len(),
        outcome.purged_assets.len()
    );
    if let Some(id) = &outcome.reopened {
        out.push_str(&format!("Opened {} instead.\n", id));
    }
    out
}

pub fn format_sweep_text(report: &SweepReport) -> String {
    if report.is_empty() {
        return "Nothing to clean up.\n".to_string();
    }
    format!(
        "Removed {} content record(s), {} disk link(s), {} asset(s).\n",
        report.contents.len(),
        report.handles.len(),
        report.assets.len()
    )
}

fn format_timestamp(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
