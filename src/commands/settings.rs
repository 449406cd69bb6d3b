// Commands for user settings: preferences, themes and keyboard shortcuts.
// Every change is persisted to the SQLite `settings` table before it returns.

use super::{AppState, CommandError, CommandResult};
use crate::store::{
    CustomTheme, Palette, Preferences, PreferencesPatch, ShortcutAction, ThemePreset,
    ThemeSelection,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- Preferences ---

pub fn get_preferences(state: &AppState) -> CommandResult<Preferences> {
    Ok(state.lock()?.preferences.get().clone())
}

/// Apply a partial update. Sliders are clamped to 1..=10.
pub fn update_preferences(state: &AppState, patch: PreferencesPatch) -> CommandResult<Preferences> {
    let mut guard = state.lock()?;
    let ws = &mut *guard;
    let updated = ws
        .preferences
        .set(&ws.db, &patch)
        .map_err(|e| CommandError::Internal(format!("Failed to save preferences: {}", e)))?;
    Ok(updated)
}

pub fn reset_preferences(state: &AppState) -> CommandResult<Preferences> {
    let mut guard = state.lock()?;
    let ws = &mut *guard;
    ws.preferences
        .reset(&ws.db)
        .map_err(|e| CommandError::Internal(format!("Failed to reset preferences: {}", e)))
}

// --- Themes ---

#[derive(Debug, Serialize)]
pub struct PresetInfo {
    pub id: ThemePreset,
    pub palette: Palette,
}

#[derive(Debug, Serialize)]
pub struct ThemeState {
    pub active: ThemeSelection,
    pub palette: Palette,
    pub presets: Vec<PresetInfo>,
    pub custom: Vec<CustomTheme>,
}

#[derive(Debug, Deserialize)]
pub struct NewCustomTheme {
    pub name: String,
    pub palette: Palette,
}

fn theme_state(state: &AppState) -> CommandResult<ThemeState> {
    let ws = state.lock()?;
    Ok(ThemeState {
        active: ws.themes.active().clone(),
        palette: ws.themes.active_palette(),
        presets: ThemePreset::ALL
            .iter()
            .map(|p| PresetInfo {
                id: *p,
                palette: p.palette(),
            })
            .collect(),
        custom: ws.themes.custom_themes().to_vec(),
    })
}

pub fn get_theme(state: &AppState) -> CommandResult<ThemeState> {
    theme_state(state)
}

pub fn set_theme(state: &AppState, selection: ThemeSelection) -> CommandResult<ThemeState> {
    {
        let mut guard = state.lock()?;
        let ws = &mut *guard;
        if let ThemeSelection::Custom(id) = &selection {
            if !ws.themes.custom_themes().iter().any(|t| &t.id == id) {
                return Err(CommandError::NotFound(format!("Custom theme not found: {}", id)));
            }
        }
        ws.themes.set_active(&ws.db, selection)?;
    }
    theme_state(state)
}

pub fn list_custom_themes(state: &AppState) -> CommandResult<Vec<CustomTheme>> {
    Ok(state.lock()?.themes.custom_themes().to_vec())
}

pub fn add_custom_theme(state: &AppState, theme: NewCustomTheme) -> CommandResult<CustomTheme> {
    let mut guard = state.lock()?;
    let ws = &mut *guard;
    let created = ws.themes.add_custom(&ws.db, &theme.name, theme.palette)?;
    log::info!("[store] Custom theme '{}' saved", created.name);
    Ok(created)
}

pub fn delete_custom_theme(state: &AppState, id: &str) -> CommandResult<()> {
    let mut guard = state.lock()?;
    let ws = &mut *guard;
    if !ws.themes.custom_themes().iter().any(|t| t.id == id) {
        return Err(CommandError::NotFound(format!("Custom theme not found: {}", id)));
    }
    ws.themes.delete_custom(&ws.db, id)?;
    Ok(())
}

// --- Shortcuts ---

#[derive(Debug, Deserialize)]
pub struct ShortcutBinding {
    pub action: ShortcutAction,
    pub combo: String,
}

pub fn get_shortcuts(state: &AppState) -> CommandResult<BTreeMap<ShortcutAction, String>> {
    Ok(state.lock()?.shortcuts.bindings().clone())
}

/// Rebind one action. Combos already bound to another action are rejected.
pub fn set_shortcut(
    state: &AppState,
    binding: ShortcutBinding,
) -> CommandResult<BTreeMap<ShortcutAction, String>> {
    let mut guard = state.lock()?;
    let ws = &mut *guard;
    ws.shortcuts.rebind(&ws.db, binding.action, &binding.combo)?;
    Ok(ws.shortcuts.bindings().clone())
}

pub fn reset_shortcuts(state: &AppState) -> CommandResult<BTreeMap<ShortcutAction, String>> {
    let mut guard = state.lock()?;
    let ws = &mut *guard;
    ws.shortcuts.reset(&ws.db)?;
    Ok(ws.shortcuts.bindings().clone())
}
