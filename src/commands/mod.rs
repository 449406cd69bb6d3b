// Command layer shared by the HTTP API and the CLI
//
// All mutable session state lives in one `Workspace` behind a single mutex.
// Commands lock it for short synchronous sections only; nothing holds the
// lock across an await.

pub mod export;
pub mod generation;
pub mod history;
pub mod settings;
pub mod templates;

use crate::ai::{AbortSignal, GenerationClient, GenerationError};
use crate::conversation::ConversationLog;
use crate::db::Database;
use crate::store::{PreferenceStore, ShortcutMap, TemplateCollection, ThemeStore};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// User-visible command failure. The display text is what callers show.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    NotFound(String),

    #[error("A generation is already in progress")]
    Busy,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

/// Store-level validation messages arrive as plain strings.
impl From<String> for CommandError {
    fn from(message: String) -> Self {
        CommandError::Invalid(message)
    }
}

impl From<GenerationError> for CommandError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::MissingApiKey => CommandError::Invalid(error.to_string()),
            other => CommandError::Upstream(other.to_string()),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

pub struct Workspace {
    pub db: Database,
    pub preferences: PreferenceStore,
    pub log: ConversationLog,
    /// Text shown as the current guide; streamed chunks append here.
    pub response: String,
    /// Abort handle of the generation currently writing to `response`.
    pub in_flight: Option<AbortSignal>,
    pub templates: TemplateCollection,
    pub themes: ThemeStore,
    pub shortcuts: ShortcutMap,
}

impl Workspace {
    /// Load every persisted collection from an already-migrated database.
    pub fn open(db: Database) -> Self {
        let preferences = PreferenceStore::load(&db);
        let templates = TemplateCollection::load(&db);
        let themes = ThemeStore::load(&db);
        let shortcuts = ShortcutMap::load(&db);
        log::info!(
            "[store] Workspace loaded ({} templates, {} custom themes)",
            templates.list().len(),
            themes.custom_themes().len()
        );

        Workspace {
            db,
            preferences,
            log: ConversationLog::new(),
            response: String::new(),
            in_flight: None,
            templates,
            themes,
            shortcuts,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.is_some()
    }
}

pub struct AppState {
    workspace: Mutex<Workspace>,
    client: Arc<dyn GenerationClient>,
}

impl AppState {
    pub fn new(db: Database, client: Arc<dyn GenerationClient>) -> Self {
        AppState {
            workspace: Mutex::new(Workspace::open(db)),
            client,
        }
    }

    pub fn lock(&self) -> CommandResult<MutexGuard<'_, Workspace>> {
        self.workspace
            .lock()
            .map_err(|e| CommandError::Internal(format!("Failed to lock workspace: {}", e)))
    }

    pub fn client(&self) -> &dyn GenerationClient {
        self.client.as_ref()
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub version: String,
    pub api_key_configured: bool,
    pub generating: bool,
    pub history_len: usize,
}

pub fn get_status(state: &AppState) -> CommandResult<StatusResponse> {
    let ws = state.lock()?;
    Ok(StatusResponse {
        name: "Livewire Architect".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_key_configured: state.client().is_configured(),
        generating: ws.is_generating(),
        history_len: ws.log.len(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    // Scripted client shared by the command tests.

    use super::AppState;
    use crate::ai::{
        AbortSignal, ChunkSink, CompletionRequest, GenerationClient, GenerationError, InlineBlob,
        StreamOutcome,
    };
    use crate::db::Database;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub struct FakeClient {
        pub chunks: Vec<String>,
        /// Fail the stream after delivering `chunks`.
        pub fail_stream: bool,
        /// Wait for the abort signal after delivering `chunks`.
        pub hang_until_aborted: bool,
        pub transcript: String,
        pub edited_image: Option<InlineBlob>,
        pub prompts: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeClient {
        pub fn streaming(chunks: &[&str]) -> Self {
            FakeClient {
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().map(|r| r.prompt.clone())
        }
    }

    impl GenerationClient for FakeClient {
        fn stream_completion<'a>(
            &'a self,
            request: CompletionRequest,
            mut on_chunk: ChunkSink<'a>,
            abort: AbortSignal,
        ) -> BoxFuture<'a, Result<StreamOutcome, GenerationError>> {
            async move {
                self.prompts.lock().unwrap().push(request);
                for chunk in &self.chunks {
                    if abort.is_aborted() {
                        return Ok(StreamOutcome::Cancelled);
                    }
                    on_chunk(chunk.as_str());
                }
                if self.fail_stream {
                    return Err(GenerationError::Api {
                        status: 500,
                        message: "upstream exploded".to_string(),
                    });
                }
                if self.hang_until_aborted {
                    abort.aborted().await;
                    return Ok(StreamOutcome::Cancelled);
                }
                Ok(StreamOutcome::Completed)
            }
            .boxed()
        }

        fn transcribe<'a>(
            &'a self,
            _audio: InlineBlob,
        ) -> BoxFuture<'a, Result<String, GenerationError>> {
            let transcript = self.transcript.clone();
            async move { Ok(transcript) }.boxed()
        }

        fn edit_image<'a>(
            &'a self,
            _image: InlineBlob,
            _instruction: String,
        ) -> BoxFuture<'a, Result<InlineBlob, GenerationError>> {
            let edited = self.edited_image.clone();
            async move {
                edited.ok_or_else(|| GenerationError::Content("No image generated".to_string()))
            }
            .boxed()
        }
    }

    pub fn state_with(client: FakeClient) -> (Arc<AppState>, Arc<FakeClient>) {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();
        let client = Arc::new(client);
        let state = Arc::new(AppState::new(db, client.clone()));
        (state, client)
    }
}
