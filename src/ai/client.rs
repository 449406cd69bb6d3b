// Generation client contract
//
// The hosted-model client is constructed once per session and injected
// wherever generation happens, so tests can substitute a fake.

use base64::Engine;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Binary payload exchanged with the model as base64 plus MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineBlob {
    pub mime_type: String,
    pub data: String,
}

impl InlineBlob {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        InlineBlob {
            mime_type: mime_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, String> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| format!("Invalid base64 payload: {}", e))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub image: Option<InlineBlob>,
}

/// How a stream ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("No API key configured. Set GEMINI_API_KEY or run `livewire key set`.")]
    MissingApiKey,

    #[error("API request failed: {0}")]
    Transport(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The model answered, but not with the content that was asked for.
    #[error("{0}")]
    Content(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl From<reqwest::Error> for GenerationError {
    fn from(error: reqwest::Error) -> Self {
        GenerationError::Transport(error.to_string())
    }
}

/// Receives each streamed fragment, in arrival order.
pub type ChunkSink<'a> = Box<dyn FnMut(&str) + Send + 'a>;

pub trait GenerationClient: Send + Sync {
    /// Whether the client has the credentials it needs to make calls.
    fn is_configured(&self) -> bool {
        true
    }

    fn stream_completion<'a>(
        &'a self,
        request: CompletionRequest,
        on_chunk: ChunkSink<'a>,
        abort: AbortSignal,
    ) -> BoxFuture<'a, Result<StreamOutcome, GenerationError>>;

    fn transcribe<'a>(&'a self, audio: InlineBlob) -> BoxFuture<'a, Result<String, GenerationError>>;

    fn edit_image<'a>(
        &'a self,
        image: InlineBlob,
        instruction: String,
    ) -> BoxFuture<'a, Result<InlineBlob, GenerationError>>;
}

#[derive(Debug, Default)]
struct AbortState {
    aborted: AtomicBool,
    notify: Notify,
}

/// Cloneable cancellation flag shared between a running stream and whoever
/// may abandon it.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    inner: Arc<AbortState>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether both handles belong to the same generation.
    pub fn same_as(&self, other: &AbortSignal) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Resolves once `abort` has been called (immediately if it already was).
    pub async fn aborted(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}
