// Commands for saved prompt templates.

use super::{AppState, CommandError, CommandResult};
use crate::store::Template;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    /// Defaults to the response currently on screen.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// All templates, newest first.
pub fn list_templates(state: &AppState) -> CommandResult<Vec<Template>> {
    Ok(state.lock()?.templates.list().to_vec())
}

pub fn save_template(state: &AppState, template: NewTemplate) -> CommandResult<Template> {
    let mut guard = state.lock()?;
    let ws = &mut *guard;
    let content = template.content.unwrap_or_else(|| ws.response.clone());
    if content.trim().is_empty() {
        return Err(CommandError::Invalid("Nothing to save: the guide is empty".to_string()));
    }
    let saved = ws.templates.save(
        &ws.db,
        &template.name,
        &content,
        template.category.as_deref(),
    )?;
    log::info!("[store] Template '{}' saved", saved.name);
    Ok(saved)
}

pub fn delete_template(state: &AppState, id: &str) -> CommandResult<()> {
    let mut guard = state.lock()?;
    let ws = &mut *guard;
    if ws.templates.get(id).is_none() {
        return Err(CommandError::NotFound(format!("Template not found: {}", id)));
    }
    ws.templates.delete(&ws.db, id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{state_with, FakeClient};

    #[test]
    fn test_template_lifecycle() {
        let (state, _) = state_with(FakeClient::default());
        let saved = save_template(
            &state,
            NewTemplate {
                name: "Reese bass".to_string(),
                content: Some("Create a detuned Reese bass".to_string()),
                category: Some("Bass".to_string()),
            },
        )
        .unwrap();

        assert_eq!(list_templates(&state).unwrap(), vec![saved.clone()]);
        delete_template(&state, &saved.id).unwrap();
        assert!(list_templates(&state).unwrap().is_empty());
        assert!(matches!(
            delete_template(&state, &saved.id),
            Err(CommandError::NotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_of_current_response() {
        let (state, _) = state_with(FakeClient::default());
        let snapshot = || NewTemplate {
            name: "Current".to_string(),
            content: None,
            category: None,
        };
        assert!(matches!(
            save_template(&state, snapshot()),
            Err(CommandError::Invalid(_))
        ));

        state.lock().unwrap().response = "1. Load **Wavetable**".to_string();
        let saved = save_template(&state, snapshot()).unwrap();
        assert_eq!(saved.content, "1. Load **Wavetable**");
        assert_eq!(saved.category, "General");
    }

    #[test]
    fn test_empty_name_rejected() {
        let (state, _) = state_with(FakeClient::default());
        let err = save_template(
            &state,
            NewTemplate {
                name: "  ".to_string(),
                content: Some("anything".to_string()),
                category: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Invalid(_)));
        assert!(list_templates(&state).unwrap().is_empty());
    }
}
