// Persisted user collections backed by the settings table.

pub mod preferences;
pub mod shortcuts;
pub mod templates;
pub mod themes;

pub use preferences::{PreferenceStore, Preferences, PreferencesPatch};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use templates::{Template, TemplateCollection};
pub use themes::{CustomTheme, Palette, ThemePreset, ThemeSelection, ThemeStore};

use rand::Rng;

/// Time-prefixed random id, e.g. `18f3a2b4c1d-9f2e4a7b`.
pub fn generate_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_differ() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(a.contains('-'));
    }
}
