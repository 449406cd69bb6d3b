// Database layer - SQLite connection, migrations, settings queries
//
// Every persisted collection (preferences, theme, custom themes, templates,
// shortcuts) lives in the `settings` table as one JSON string per key.

use rusqlite::{params, Connection, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub const PREFERENCES_KEY: &str = "preferences";
pub const THEME_KEY: &str = "theme";
pub const CUSTOM_THEMES_KEY: &str = "custom_themes";
pub const TEMPLATES_KEY: &str = "templates";
pub const SHORTCUTS_KEY: &str = "shortcuts";

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Database { conn })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Database { conn })
    }

    /// Run migrations to set up the database schema
    pub fn run_migrations(&self) -> Result<()> {
        let migration_001 = include_str!("migrations/001_init.sql");
        self.conn.execute_batch(migration_001)?;
        Ok(())
    }

    // --- Settings operations ---

    /// Get a setting value by key. Returns None if the key doesn't exist.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM settings WHERE key = ?")?;
        let result = stmt.query_row([key], |row| row.get::<_, Option<String>>(0));

        match result {
            Ok(value) => Ok(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a setting value (upsert: insert or update if key exists).
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a setting by key.
    pub fn delete_setting(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
        Ok(())
    }

    // --- Typed JSON helpers ---

    /// Load a JSON-encoded setting, falling back to `T::default()` when the
    /// key is missing, unreadable, or holds corrupt JSON.
    pub fn load_json_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.get_setting(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("[store] Discarding corrupt value for '{}': {}", key, e);
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                log::warn!("[store] Failed to read '{}': {}", key, e);
                T::default()
            }
        }
    }

    /// Serialize `value` and store it under `key`.
    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) -> std::result::Result<(), String> {
        let json = serde_json::to_string(value)
            .map_err(|e| format!("Failed to serialize '{}': {}", key, e))?;
        self.set_setting(key, &json)
            .map_err(|e| format!("Failed to save '{}': {}", key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_database_creation() {
        let db = Database::new_in_memory().expect("Failed to create in-memory database");
        db.run_migrations().expect("Failed to run migrations");
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();
        db.set_setting("theme", "\"neon\"").unwrap();
        db.run_migrations().unwrap();
        assert_eq!(db.get_setting("theme").unwrap(), Some("\"neon\"".to_string()));
    }

    #[test]
    fn test_get_setting_nonexistent() {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();

        let result = db.get_setting("nonexistent_key").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_set_setting_upsert() {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();

        db.set_setting("theme", "midnight").unwrap();
        assert_eq!(db.get_setting("theme").unwrap(), Some("midnight".to_string()));

        db.set_setting("theme", "carbon").unwrap();
        assert_eq!(db.get_setting("theme").unwrap(), Some("carbon".to_string()));
    }

    #[test]
    fn test_delete_setting() {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();

        db.set_setting("theme", "neon").unwrap();
        db.delete_setting("theme").unwrap();
        assert_eq!(db.get_setting("theme").unwrap(), None);

        // Deleting a missing key is not an error
        assert!(db.delete_setting("nonexistent").is_ok());
    }

    #[test]
    fn test_json_round_trip_through_settings() {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();

        let mut value = BTreeMap::new();
        value.insert("generate".to_string(), "Ctrl+Enter".to_string());
        db.save_json(SHORTCUTS_KEY, &value).unwrap();

        let loaded: BTreeMap<String, String> = db.load_json_or_default(SHORTCUTS_KEY);
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_corrupt_json_falls_back_to_default() {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();

        db.set_setting(TEMPLATES_KEY, "{not json").unwrap();
        let loaded: Vec<String> = db.load_json_or_default(TEMPLATES_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_settings_persist_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livewire.db");

        {
            let db = Database::new(&path).unwrap();
            db.run_migrations().unwrap();
            db.set_setting(THEME_KEY, "\"dawn\"").unwrap();
        }

        let db = Database::new(&path).unwrap();
        db.run_migrations().unwrap();
        assert_eq!(db.get_setting(THEME_KEY).unwrap(), Some("\"dawn\"".to_string()));
    }
}
