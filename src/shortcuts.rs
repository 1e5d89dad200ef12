//! Keyboard shortcut table and override resolution.

use crate::settings::Settings;
use serde::Serialize;
use std::collections::HashMap;

/// Where a shortcut is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShortcutScope {
    Global,
    FileTree,
    Editor,
}

impl ShortcutScope {
    /// Global shortcuts fire everywhere, so they clash with every scope.
    fn overlaps(self, other: ShortcutScope) -> bool {
        self == other || self == ShortcutScope::Global || other == ShortcutScope::Global
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShortcutDef {
    pub id: &'static str,
    pub scope: ShortcutScope,
    pub default_binding: &'static str,
}

const fn def(id: &'static str, scope: ShortcutScope, default_binding: &'static str) -> ShortcutDef {
    ShortcutDef {
        id,
        scope,
        default_binding,
    }
}

pub const SHORTCUT_DEFS: &[ShortcutDef] = &[
    def("ui.toggleFileTree", ShortcutScope::Global, "Mod+\\"),
    def("ui.togglePreview", ShortcutScope::Global, "Mod+P"),
    def("ui.showSettings", ShortcutScope::Global, "Mod+,"),
    def("fmt.h1", ShortcutScope::Editor, "Mod+Alt+1"),
    def("fmt.h2", ShortcutScope::Editor, "Mod+Alt+2"),
    def("fmt.h3", ShortcutScope::Editor, "Mod+Alt+3"),
    def("fmt.h4", ShortcutScope::Editor, "Mod+Alt+4"),
    def("fmt.bold", ShortcutScope::Editor, "Mod+B"),
    def("fmt.italic", ShortcutScope::Editor, "Mod+I"),
    def("fmt.underline", ShortcutScope::Editor, "Mod+Shift+U"),
    def("fmt.strike", ShortcutScope::Editor, "Mod+Shift+X"),
    def("fmt.code", ShortcutScope::Editor, "Mod+`"),
    def("fmt.codeBlock", ShortcutScope::Editor, "Mod+Alt+C"),
    def("fmt.quote", ShortcutScope::Editor, "Mod+Alt+Q"),
    def("fmt.ul", ShortcutScope::Editor, "Mod+Alt+L"),
    def("fmt.ol", ShortcutScope::Editor, "Mod+Alt+Shift+L"),
    def("fmt.link", ShortcutScope::Editor, "Mod+K"),
    def("fmt.image", ShortcutScope::Editor, "Mod+Alt+I"),
    def("fmt.task", ShortcutScope::Editor, "Mod+Alt+T"),
    def("fmt.table", ShortcutScope::Editor, "Mod+Alt+Shift+T"),
    def("fmt.hr", ShortcutScope::Editor, "Mod+Alt+-"),
    def("file.new", ShortcutScope::Global, "Mod+N"),
    def("folder.new", ShortcutScope::Global, "Mod+Shift+N"),
    def("node.rename", ShortcutScope::FileTree, "Enter"),
    def("node.delete", ShortcutScope::FileTree, "Mod+Backspace"),
    def("node.move", ShortcutScope::FileTree, "Mod+M"),
    def("file.openLocal", ShortcutScope::Global, "Mod+O"),
    def("file.importFolder", ShortcutScope::Global, "Mod+Shift+O"),
    def("file.saveToLocal", ShortcutScope::Global, "Mod+S"),
    def("export.md", ShortcutScope::Global, "Mod+Shift+S"),
    def("export.html", ShortcutScope::Global, "Mod+Alt+S"),
    def("export.pdf", ShortcutScope::Global, "Mod+Alt+P"),
];

pub fn find_def(id: &str) -> Option<&'static ShortcutDef> {
    SHORTCUT_DEFS.iter().find(|d| d.id == id)
}

/// Binding in effect for an action: the override if present, `None` when the
/// override is empty (disabled), otherwise the default. Unknown actions have none.
pub fn effective_binding(settings: &Settings, id: &str) -> Option<String> {
    let def = find_def(id)?;
    match settings.shortcuts.get(id) {
        Some(custom) if custom.trim().is_empty() => None,
        Some(custom) => Some(custom.clone()),
        None => Some(def.default_binding.to_string()),
    }
}

/// Bindings shared by two enabled actions whose scopes overlap.
///
/// Bindings are compared case-insensitively. Each pair is reported once.
pub fn conflicts(settings: &Settings) -> Vec<(&'static str, &'static str, String)> {
    let mut by_binding: HashMap<String, Vec<&'static ShortcutDef>> = HashMap::new();
    for def in SHORTCUT_DEFS {
        if let Some(binding) = effective_binding(settings, def.id) {
            by_binding.entry(binding.to_lowercase()).or_default().push(def);
        }
    }

    let mut found = Vec::new();
    for (binding, defs) in by_binding {
        for (i, a) in defs.iter().enumerate() {
            for b in &defs[i + 1..] {
                if a.scope.overlaps(b.scope) {
                    found.push((a.id, b.id, binding.clone()));
                }
            }
        }
    }
    found.sort();
    found
}
