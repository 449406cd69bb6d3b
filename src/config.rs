// Runtime configuration shared by the server and CLI entry points.

use crate::ai::credentials::CredentialManager;
use crate::ai::gemini_client::GEMINI_API_BASE;
use crate::ai::GeminiClient;
use crate::commands::AppState;
use crate::db::Database;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8484;
pub const DEFAULT_DB_FILE: &str = "livewire.db";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// Explicit key from the command line or environment. When absent the OS
    /// keychain is consulted.
    pub api_key: Option<String>,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            port: DEFAULT_PORT,
            api_key: None,
            api_base: GEMINI_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Explicit key first, then the keychain. Keychain failures are logged and
    /// treated as "no key" so the app still starts.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            return Some(key.to_string());
        }
        match CredentialManager::retrieve_api_key() {
            Ok(key) => key,
            Err(e) => {
                log::warn!("[config] Keychain unavailable: {}", e);
                None
            }
        }
    }

    pub fn open_database(&self) -> Result<Database, String> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }

        let db = Database::new(&self.db_path)
            .map_err(|e| format!("Failed to open database {}: {}", self.db_path.display(), e))?;
        db.run_migrations()
            .map_err(|e| format!("Failed to run migrations: {}", e))?;
        log::info!("[store] Database ready at {}", self.db_path.display());
        Ok(db)
    }

    /// Open storage and construct the one client for this session.
    pub fn build_state(&self) -> Result<AppState, String> {
        let db = self.open_database()?;
        let api_key = self.resolve_api_key();
        if api_key.is_none() {
            log::warn!("[config] No Gemini API key configured; generation requests will fail");
        }

        let client = GeminiClient::new(api_key, &self.api_base, self.request_timeout)
            .map_err(|e| e.to_string())?;
        Ok(AppState::new(db, Arc::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_wins() {
        let config = AppConfig {
            api_key: Some("  AIzaExplicitKey  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("AIzaExplicitKey"));
    }

    #[test]
    fn test_open_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            db_path: dir.path().join("nested").join("livewire.db"),
            ..Default::default()
        };

        let db = config.open_database().unwrap();
        db.set_setting("opened", "1").unwrap();
        assert!(config.db_path.exists());
    }
}
