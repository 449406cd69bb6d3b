// Export the current guide as a downloadable document.

use super::{AppState, CommandError, CommandResult};
use crate::export::{export, ExportFormat};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ExportedDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

pub fn export_response(state: &AppState, format: ExportFormat) -> CommandResult<ExportedDocument> {
    let ws = state.lock()?;
    if ws.response.trim().is_empty() {
        return Err(CommandError::Invalid("Nothing to export yet".to_string()));
    }

    let palette = ws.themes.active_palette();
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M");
    Ok(ExportedDocument {
        filename: format!("livewire-guide-{}.{}", stamp, format.file_extension()),
        content_type: format.content_type(),
        body: export(&ws.response, format, &palette),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{state_with, FakeClient};
    use crate::store::{ThemePreset, ThemeSelection};

    #[test]
    fn test_export_uses_active_palette() {
        let (state, _) = state_with(FakeClient::default());
        assert!(export_response(&state, ExportFormat::Html).is_err());

        {
            let mut guard = state.lock().unwrap();
            let ws = &mut *guard;
            ws.response = "## Pad\n- Add **Chorus-Ensemble**".to_string();
            ws.themes
                .set_active(&ws.db, ThemeSelection::Preset(ThemePreset::Neon))
                .unwrap();
        }

        let doc = export_response(&state, ExportFormat::Html).unwrap();
        assert!(doc.filename.ends_with(".html"));
        assert_eq!(doc.content_type, "text/html; charset=utf-8");
        assert!(doc.body.contains(&ThemePreset::Neon.palette().base));

        let doc = export_response(&state, ExportFormat::Text).unwrap();
        assert_eq!(doc.body, "Pad\n- Add Chorus-Ensemble");
    }
}
