// Keyboard shortcut bindings.

use crate::db::{Database, SHORTCUTS_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortcutAction {
    Generate,
    Undo,
    Redo,
    TabGuide,
    TabArrangement,
    TabMidi,
    TabEffects,
}

impl ShortcutAction {
    pub const ALL: [ShortcutAction; 7] = [
        ShortcutAction::Generate,
        ShortcutAction::Undo,
        ShortcutAction::Redo,
        ShortcutAction::TabGuide,
        ShortcutAction::TabArrangement,
        ShortcutAction::TabMidi,
        ShortcutAction::TabEffects,
    ];

    pub fn default_key(self) -> &'static str {
        match self {
            ShortcutAction::Generate => "Ctrl+Enter",
            ShortcutAction::Undo => "Ctrl+Z",
            ShortcutAction::Redo => "Ctrl+Shift+Z",
            ShortcutAction::TabGuide => "Alt+1",
            ShortcutAction::TabArrangement => "Alt+2",
            ShortcutAction::TabMidi => "Alt+3",
            ShortcutAction::TabEffects => "Alt+4",
        }
    }
}

/// Canonical form used for conflict checks: trimmed, `+`-separated parts
/// with modifiers title-cased and single-character keys upper-cased. A
/// trailing `++` binds the plus key itself (`Ctrl++`).
pub fn normalize_combo(combo: &str) -> Option<String> {
    let combo = combo.trim();
    let (head, plus_key) = match combo.strip_suffix('+').map(str::trim_end) {
        Some("") => ("", true),
        Some(rest) => match rest.strip_suffix('+') {
            Some(modifiers) => (modifiers, true),
            None => (combo, false),
        },
        None => (combo, false),
    };

    let mut parts: Vec<String> = if head.is_empty() {
        Vec::new()
    } else {
        head.split('+').map(str::trim).map(title_case).collect()
    };
    if plus_key {
        parts.push("+".to_string());
    }

    if parts.is_empty() || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts.join("+"))
}

fn title_case(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if part.chars().count() == 1 => first.to_ascii_uppercase().to_string(),
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutMap {
    bindings: BTreeMap<ShortcutAction, String>,
}

impl Default for ShortcutMap {
    fn default() -> Self {
        ShortcutMap {
            bindings: ShortcutAction::ALL
                .iter()
                .map(|a| (*a, a.default_key().to_string()))
                .collect(),
        }
    }
}

impl ShortcutMap {
    /// Load stored bindings; actions missing from storage keep their default.
    pub fn load(db: &Database) -> Self {
        let stored: BTreeMap<ShortcutAction, String> = db.load_json_or_default(SHORTCUTS_KEY);
        let mut map = ShortcutMap::default();
        for (action, key) in stored {
            if let Some(key) = normalize_combo(&key) {
                map.bindings.insert(action, key);
            }
        }
        map
    }

    pub fn bindings(&self) -> &BTreeMap<ShortcutAction, String> {
        &self.bindings
    }

    pub fn key_for(&self, action: ShortcutAction) -> &str {
        self.bindings
            .get(&action)
            .map(String::as_str)
            .unwrap_or_else(|| action.default_key())
    }

    /// Find the action bound to a key combo.
    pub fn action_for(&self, combo: &str) -> Option<ShortcutAction> {
        let combo = normalize_combo(combo)?;
        self.bindings
            .iter()
            .find(|(_, key)| **key == combo)
            .map(|(action, _)| *action)
    }

    pub fn rebind(&mut self, db: &Database, action: ShortcutAction, combo: &str) -> Result<(), String> {
        let combo = normalize_combo(combo)
            .ok_or_else(|| format!("Invalid key combination '{}'", combo))?;

        if let Some(other) = self.action_for(&combo) {
            if other != action {
                return Err(format!("'{}' is already bound to {:?}", combo, other));
            }
        }

        let previous = self.bindings.insert(action, combo);
        if let Err(e) = db.save_json(SHORTCUTS_KEY, &self.bindings) {
            if let Some(previous) = previous {
                self.bindings.insert(action, previous);
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn reset(&mut self, db: &Database) -> Result<(), String> {
        *self = ShortcutMap::default();
        db.save_json(SHORTCUTS_KEY, &self.bindings)
    }
}
