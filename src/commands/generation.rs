// Generation commands: guide streaming, regeneration, tools, transcription
// and image editing.
//
// A generation runs in two steps. `begin_*` validates the request under the
// workspace lock, marks the workspace busy and returns a `PendingGeneration`.
// `run` streams chunks into the response buffer and settles the exchange:
// completed exchanges are committed to the log as a (user, model) pair,
// cancelled ones keep their partial text without being logged, and failed
// ones restore the previous response.

use super::{AppState, CommandError, CommandResult, Workspace};
use crate::ai::{
    compile, find_tool, AbortSignal, CompletionRequest, InlineBlob, Modifier, StreamOutcome,
    ToolParams,
};
use crate::conversation::Message;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<InlineBlob>,
    /// Applied to a first generation the same way a regenerate applies it.
    #[serde(default)]
    pub modifier: Option<Modifier>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub outcome: StreamOutcome,
    pub text: String,
}

/// A validated request that owns the busy slot until `run` settles it.
#[derive(Debug)]
pub struct PendingGeneration {
    user: Message,
    request: CompletionRequest,
    abort: AbortSignal,
    previous_response: String,
}

impl PendingGeneration {
    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }
}

/// Free the busy slot, but only if it still belongs to `signal`. A newer
/// generation may already own it.
fn release(ws: &mut Workspace, signal: &AbortSignal) {
    if ws.in_flight.as_ref().is_some_and(|current| current.same_as(signal)) {
        ws.in_flight = None;
    }
}

/// Clears the busy slot however `run` exits, including when its future is dropped.
struct InFlightGuard<'a> {
    state: &'a AppState,
    signal: AbortSignal,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut ws) = self.state.lock() {
            release(&mut ws, &self.signal);
        }
    }
}

fn begin(
    state: &AppState,
    text: String,
    image: Option<InlineBlob>,
    modifier: Option<Modifier>,
) -> CommandResult<PendingGeneration> {
    let text = text.trim().to_string();
    if text.is_empty() && image.is_none() {
        return Err(CommandError::Invalid(
            "Enter a request or attach an image".to_string(),
        ));
    }

    let mut ws = state.lock()?;
    if ws.is_generating() {
        return Err(CommandError::Busy);
    }

    let prompt = compile(&text, ws.preferences.get(), modifier);
    let abort = AbortSignal::new();

    ws.log.clear_redo();
    ws.in_flight = Some(abort.clone());
    let previous_response = std::mem::take(&mut ws.response);

    Ok(PendingGeneration {
        user: Message::user(text, image.clone()),
        request: CompletionRequest { prompt, image },
        abort,
        previous_response,
    })
}

pub fn begin_generate(state: &AppState, request: GenerateRequest) -> CommandResult<PendingGeneration> {
    begin(state, request.text, request.image, request.modifier)
}

/// Re-run the request behind the current guide with a one-tap modifier.
pub fn begin_regenerate(state: &AppState, modifier: Modifier) -> CommandResult<PendingGeneration> {
    let (text, image) = {
        let ws = state.lock()?;
        let last = ws
            .log
            .last_request()
            .ok_or_else(|| CommandError::Invalid("Nothing to regenerate yet".to_string()))?;
        (last.text.clone(), last.image.clone())
    };
    begin(state, text, image, Some(modifier))
}

pub fn begin_tool(state: &AppState, tool_id: &str, params: &ToolParams) -> CommandResult<PendingGeneration> {
    let tool =
        find_tool(tool_id).ok_or_else(|| CommandError::NotFound(format!("Unknown tool: {}", tool_id)))?;
    let text = tool.render(params)?;
    begin(state, text, None, None)
}

/// Stream a pending generation to completion. `on_chunk` sees each fragment
/// after it has been appended to the response buffer.
pub async fn run<F>(
    state: &AppState,
    pending: PendingGeneration,
    mut on_chunk: F,
) -> CommandResult<GenerationResult>
where
    F: FnMut(&str) + Send,
{
    let PendingGeneration {
        user,
        request,
        abort,
        previous_response,
    } = pending;
    let _guard = InFlightGuard {
        state,
        signal: abort.clone(),
    };
    let signal = abort.clone();

    let sink = Box::new(|chunk: &str| {
        if let Ok(mut ws) = state.lock() {
            ws.response.push_str(chunk);
        }
        on_chunk(chunk);
    });

    let result = state.client().stream_completion(request, sink, abort).await;

    let mut ws = state.lock()?;
    release(&mut ws, &signal);
    match result {
        Ok(StreamOutcome::Completed) => {
            let text = ws.response.clone();
            ws.log.record_exchange(user, Message::model(text.clone()));
            log::info!("[generate] Completed ({} chars, {} log entries)", text.len(), ws.log.len());
            Ok(GenerationResult {
                outcome: StreamOutcome::Completed,
                text,
            })
        }
        Ok(StreamOutcome::Cancelled) => {
            // Nothing arrived: keep the guide that was on screen
            if ws.response.is_empty() {
                ws.response = previous_response;
            }
            log::info!("[generate] Cancelled with {} chars buffered", ws.response.len());
            Ok(GenerationResult {
                outcome: StreamOutcome::Cancelled,
                text: ws.response.clone(),
            })
        }
        Err(e) => {
            log::error!("[generate] Generation failed: {}", e);
            ws.response = previous_response;
            Err(e.into())
        }
    }
}

pub async fn generate<F>(
    state: &AppState,
    request: GenerateRequest,
    on_chunk: F,
) -> CommandResult<GenerationResult>
where
    F: FnMut(&str) + Send,
{
    let pending = begin_generate(state, request)?;
    run(state, pending, on_chunk).await
}

/// Abort the in-flight generation. Returns false when nothing was running.
pub fn cancel(state: &AppState) -> CommandResult<bool> {
    let ws = state.lock()?;
    match &ws.in_flight {
        Some(abort) => {
            abort.abort();
            log::info!("[generate] Cancel requested");
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Transcribe recorded audio into request text. Nothing is logged.
pub async fn transcribe(state: &AppState, audio: InlineBlob) -> CommandResult<String> {
    if audio.data.is_empty() {
        return Err(CommandError::Invalid("Audio recording is empty".to_string()));
    }
    let text = state.client().transcribe(audio).await.map_err(|e| {
        log::error!("[generate] Transcription failed: {}", e);
        CommandError::from(e)
    })?;
    Ok(text.trim().to_string())
}

/// Edit an image. The exchange is logged only when an image comes back.
pub async fn edit_image(
    state: &AppState,
    image: InlineBlob,
    instruction: String,
) -> CommandResult<InlineBlob> {
    let instruction = instruction.trim().to_string();
    if instruction.is_empty() {
        return Err(CommandError::Invalid(
            "Describe how the image should change".to_string(),
        ));
    }
    if image.data.is_empty() {
        return Err(CommandError::Invalid("No image attached".to_string()));
    }

    let user = Message::user(instruction.clone(), Some(image.clone()));
    let edited = state
        .client()
        .edit_image(image, instruction)
        .await
        .map_err(|e| {
            log::error!("[generate] Image edit failed: {}", e);
            CommandError::from(e)
        })?;

    let mut ws = state.lock()?;
    ws.log.clear_redo();
    ws.log.record_exchange(user, Message::model_image(edited.clone()));
    Ok(edited)
}
