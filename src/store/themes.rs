// Theme selection and user-defined palettes.

use crate::db::{Database, CUSTOM_THEMES_KEY, THEME_KEY};
use serde::{Deserialize, Serialize};

/// Seven colours, each `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub base: String,
    pub surface: String,
    pub panel: String,
    pub border: String,
    pub text: String,
    pub muted: String,
    pub accent: String,
}

impl Palette {
    fn from_hex(colors: [&str; 7]) -> Self {
        let [base, surface, panel, border, text, muted, accent] = colors;
        Palette {
            base: base.to_string(),
            surface: surface.to_string(),
            panel: panel.to_string(),
            border: border.to_string(),
            text: text.to_string(),
            muted: muted.to_string(),
            accent: accent.to_string(),
        }
    }

    fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("base", self.base.as_str()),
            ("surface", self.surface.as_str()),
            ("panel", self.panel.as_str()),
            ("border", self.border.as_str()),
            ("text", self.text.as_str()),
            ("muted", self.muted.as_str()),
            ("accent", self.accent.as_str()),
        ]
    }

    /// Check every colour is a `#rrggbb` hex string.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in self.entries() {
            if !is_hex_color(value) {
                return Err(format!("Invalid {} colour '{}': expected #rrggbb", name, value));
            }
        }
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreset {
    #[default]
    Live,
    Midnight,
    Carbon,
    Dawn,
    Neon,
}

impl ThemePreset {
    pub const ALL: [ThemePreset; 5] = [
        ThemePreset::Live,
        ThemePreset::Midnight,
        ThemePreset::Carbon,
        ThemePreset::Dawn,
        ThemePreset::Neon,
    ];

    pub fn palette(self) -> Palette {
        match self {
            ThemePreset::Live => Palette::from_hex([
                "#1e1e1e", "#2a2a2a", "#333333", "#444444", "#e6e6e6", "#8c8c8c", "#ff764d",
            ]),
            ThemePreset::Midnight => Palette::from_hex([
                "#0b0f1a", "#131a2a", "#1a2336", "#26324a", "#dde6f5", "#7a88a3", "#4da3ff",
            ]),
            ThemePreset::Carbon => Palette::from_hex([
                "#121212", "#1b1b1b", "#242424", "#303030", "#f0f0f0", "#9a9a9a", "#ffd23f",
            ]),
            ThemePreset::Dawn => Palette::from_hex([
                "#f6f1ea", "#ffffff", "#efe7dc", "#d9cdbd", "#2b2420", "#7d7066", "#d9480f",
            ]),
            ThemePreset::Neon => Palette::from_hex([
                "#0a0014", "#140026", "#1f0038", "#3a0a5e", "#f5e9ff", "#a58bc2", "#00ff99",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTheme {
    pub id: String,
    pub name: String,
    pub palette: Palette,
}

/// The single active theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ThemeSelection {
    Preset(ThemePreset),
    Custom(String),
}

impl Default for ThemeSelection {
    fn default() -> Self {
        ThemeSelection::Preset(ThemePreset::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThemeStore {
    active: ThemeSelection,
    custom: Vec<CustomTheme>,
}

impl ThemeStore {
    pub fn load(db: &Database) -> Self {
        let custom: Vec<CustomTheme> = db.load_json_or_default(CUSTOM_THEMES_KEY);
        let mut active: ThemeSelection = db.load_json_or_default(THEME_KEY);

        // A selection pointing at a deleted custom theme reverts to the default
        if let ThemeSelection::Custom(id) = &active {
            if !custom.iter().any(|t| &t.id == id) {
                log::warn!("[store] Active custom theme {} no longer exists", id);
                active = ThemeSelection::default();
            }
        }

        ThemeStore { active, custom }
    }

    pub fn active(&self) -> &ThemeSelection {
        &self.active
    }

    pub fn custom_themes(&self) -> &[CustomTheme] {
        &self.custom
    }

    /// Palette of the active theme.
    pub fn active_palette(&self) -> Palette {
        match &self.active {
            ThemeSelection::Preset(preset) => preset.palette(),
            ThemeSelection::Custom(id) => self
                .custom
                .iter()
                .find(|t| &t.id == id)
                .map(|t| t.palette.clone())
                .unwrap_or_else(|| ThemePreset::default().palette()),
        }
    }

    pub fn set_active(&mut self, db: &Database, selection: ThemeSelection) -> Result<(), String> {
        if let ThemeSelection::Custom(id) = &selection {
            if !self.custom.iter().any(|t| &t.id == id) {
                return Err(format!("Custom theme not found: {}", id));
            }
        }
        db.save_json(THEME_KEY, &selection)?;
        self.active = selection;
        Ok(())
    }

    pub fn add_custom(
        &mut self,
        db: &Database,
        name: &str,
        palette: Palette,
    ) -> Result<CustomTheme, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Theme name cannot be empty".to_string());
        }
        palette.validate()?;

        let theme = CustomTheme {
            id: super::generate_id(),
            name: name.to_string(),
            palette,
        };
        self.custom.push(theme.clone());
        if let Err(e) = db.save_json(CUSTOM_THEMES_KEY, &self.custom) {
            self.custom.pop();
            return Err(e);
        }
        Ok(theme)
    }

    /// Delete a custom theme. If it was active, the default preset becomes active.
    pub fn delete_custom(&mut self, db: &Database, id: &str) -> Result<(), String> {
        let original_len = self.custom.len();
        self.custom.retain(|t| t.id != id);
        if self.custom.len() == original_len {
            return Err(format!("Custom theme not found: {}", id));
        }
        db.save_json(CUSTOM_THEMES_KEY, &self.custom)?;

        if self.active == ThemeSelection::Custom(id.to_string()) {
            self.set_active(db, ThemeSelection::default())?;
        }
        Ok(())
    }
}
