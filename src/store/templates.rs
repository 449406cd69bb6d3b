// Saved guide templates: frozen snapshots of generated responses.

use crate::db::{Database, TEMPLATES_KEY};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub content: String,
    pub category: String,
    pub created_at: i64,
}

/// Newest-first list of templates mirrored to the settings table.
#[derive(Debug, Clone, Default)]
pub struct TemplateCollection {
    items: Vec<Template>,
}

impl TemplateCollection {
    /// Load saved templates. Corrupt JSON yields an empty collection.
    pub fn load(db: &Database) -> Self {
        TemplateCollection {
            items: db.load_json_or_default(TEMPLATES_KEY),
        }
    }

    pub fn list(&self) -> &[Template] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.items.iter().find(|t| t.id == id)
    }

    /// Save a snapshot of `content` under `name`. The name is trimmed and
    /// must not be empty; an empty category becomes "General".
    pub fn save(
        &mut self,
        db: &Database,
        name: &str,
        content: &str,
        category: Option<&str>,
    ) -> Result<Template, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Template name cannot be empty".to_string());
        }
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);

        let template = Template {
            id: super::generate_id(),
            name: name.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        self.items.insert(0, template.clone());
        if let Err(e) = db.save_json(TEMPLATES_KEY, &self.items) {
            self.items.remove(0);
            return Err(e);
        }
        Ok(template)
    }

    /// Delete a template by id. Returns an error if no such template exists.
    pub fn delete(&mut self, db: &Database, id: &str) -> Result<(), String> {
        let original_len = self.items.len();
        self.items.retain(|t| t.id != id);
        if self.items.len() == original_len {
            return Err(format!("Template not found: {}", id));
        }
        db.save_json(TEMPLATES_KEY, &self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();
        db
    }

    #[test]
    fn test_save_and_reload() {
        let db = test_db();
        let mut templates = TemplateCollection::load(&db);

        let saved = templates
            .save(&db, "  Dark Bass  ", "## Concept\nUse Operator", Some("Bass"))
            .unwrap();
        assert_eq!(saved.name, "Dark Bass");
        assert_eq!(saved.category, "Bass");

        let reloaded = TemplateCollection::load(&db);
        assert_eq!(reloaded.list(), &[saved]);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let db = test_db();
        let mut templates = TemplateCollection::load(&db);

        assert!(templates.save(&db, "", "content", None).is_err());
        assert!(templates.save(&db, "   ", "content", None).is_err());
        assert!(templates.list().is_empty());
        assert!(TemplateCollection::load(&db).list().is_empty());
    }

    #[test]
    fn test_blank_category_defaults_to_general() {
        let db = test_db();
        let mut templates = TemplateCollection::load(&db);
        let saved = templates.save(&db, "Pads", "text", Some("  ")).unwrap();
        assert_eq!(saved.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_newest_first() {
        let db = test_db();
        let mut templates = TemplateCollection::load(&db);
        templates.save(&db, "First", "a", None).unwrap();
        templates.save(&db, "Second", "b", None).unwrap();

        let names: Vec<&str> = templates.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        let mut templates = TemplateCollection::load(&db);
        let saved = templates.save(&db, "Keep?", "x", None).unwrap();

        templates.delete(&db, &saved.id).unwrap();
        assert!(templates.list().is_empty());
        assert!(templates.delete(&db, &saved.id).is_err());
        assert!(TemplateCollection::load(&db).list().is_empty());
    }

    #[test]
    fn test_corrupt_templates_load_empty() {
        let db = test_db();
        db.set_setting(TEMPLATES_KEY, "{\"this is\": not json").unwrap();

        let templates = TemplateCollection::load(&db);
        assert!(templates.list().is_empty());
    }
}
