// Gemini API client with streaming support
//
// Implements communication with Google's Generative Language API for:
// - Guide generation streamed over server-sent events
// - One-shot audio transcription
// - One-shot image editing

use super::client::{
    AbortSignal, ChunkSink, CompletionRequest, GenerationClient, GenerationError, InlineBlob,
    StreamOutcome,
};
use super::system_prompt::SYSTEM_PROMPT;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const TEXT_MODEL: &str = "gemini-3-flash-preview";
const VISION_MODEL: &str = "gemini-3-pro-preview";
const TRANSCRIBE_MODEL: &str = "gemini-3-flash-preview";
const IMAGE_EDIT_MODEL: &str = "gemini-2.5-flash-image";
const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 2000;
const TRANSCRIBE_INSTRUCTION: &str = "Transcribe this audio exactly as spoken.";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Faster model for text-only requests, multimodal model when an image is attached.
pub fn select_model(has_image: bool) -> &'static str {
    if has_image {
        VISION_MODEL
    } else {
        TEXT_MODEL
    }
}

// ─── Wire types ───

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineBlob>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Part {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn blob(blob: InlineBlob) -> Self {
        Part {
            text: None,
            inline_data: Some(blob),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    fn user(parts: Vec<Part>) -> Self {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: None,
            generation_config: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
            .iter()
    }

    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }

    fn first_image(&self) -> Option<InlineBlob> {
        self.parts().find_map(|p| p.inline_data.clone())
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

/// Decode one streamed payload: an error envelope, a blocked prompt, or text.
fn parse_stream_payload(payload: &str) -> Result<String, GenerationError> {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(payload) {
        return Err(GenerationError::Api {
            status: envelope.error.code,
            message: envelope.error.message,
        });
    }
    let response: GenerateResponse = serde_json::from_str(payload)
        .map_err(|e| GenerationError::Malformed(format!("{} in stream event", e)))?;
    if let Some(reason) = response.block_reason() {
        return Err(GenerationError::Content(format!("Request blocked: {}", reason)));
    }
    Ok(response.text())
}

/// Build the user turn: optional image first, then the wrapped prompt.
fn user_parts(request: &CompletionRequest) -> Vec<Part> {
    match &request.image {
        Some(image) => vec![
            Part::blob(image.clone()),
            Part::text(format!("Analyze this image and {}", request.prompt)),
        ],
        None => vec![Part::text(format!(
            "Create an Ableton Live 12 guide for: {}",
            request.prompt
        ))],
    }
}

// ─── Server-sent events ───

/// Incremental decoder for `text/event-stream` bodies. Feed raw bytes as they
/// arrive; complete events come back as their joined `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.handle_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.handle_line(line.trim_end_matches('\r'));
        }
        self.take_event()
    }

    fn handle_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.take_event();
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // Comments (":") and event/id/retry fields carry nothing we use
        None
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data).join("\n"))
        }
    }
}

// ─── Client ───

pub struct GeminiClient {
    api_key: Option<String>,
    api_base: String,
    client: Client,
    request_timeout: Duration,
}

impl GeminiClient {
    /// Create a client. A missing key is allowed; calls then fail with
    /// `GenerationError::MissingApiKey`.
    pub fn new(
        api_key: Option<String>,
        api_base: &str,
        request_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
            request_timeout,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, model, method)
    }

    async fn post(&self, url: &str, body: &GenerateRequest) -> Result<Response, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ApiErrorEnvelope>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(GenerationError::Api { status, message });
        }

        Ok(response)
    }

    /// Non-streaming generateContent call bounded by the request timeout.
    async fn generate_once(
        &self,
        model: &str,
        body: GenerateRequest,
    ) -> Result<GenerateResponse, GenerationError> {
        let url = self.endpoint(model, "generateContent");
        let call = async {
            let response = self.post(&url, &body).await?;
            response
                .json::<GenerateResponse>()
                .await
                .map_err(|e| GenerationError::Malformed(e.to_string()))
        };

        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| GenerationError::Timeout(self.request_timeout.as_secs()))?
    }

    async fn stream_guide(
        &self,
        request: CompletionRequest,
        mut on_chunk: ChunkSink<'_>,
        abort: AbortSignal,
    ) -> Result<StreamOutcome, GenerationError> {
        let model = select_model(request.image.is_some());
        let url = format!("{}?alt=sse", self.endpoint(model, "streamGenerateContent"));
        let mut body = GenerateRequest::user(user_parts(&request));
        body.system_instruction = Some(Content {
            role: None,
            parts: vec![Part::text(SYSTEM_PROMPT)],
        });
        body.generation_config = Some(GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        });

        log::info!(
            "[gemini] Streaming guide with {} ({} prompt chars, image: {})",
            model,
            request.prompt.len(),
            request.image.is_some()
        );

        let deadline = tokio::time::Instant::now() + self.request_timeout;
        let timeout_secs = self.request_timeout.as_secs();

        let response = tokio::select! {
            _ = abort.aborted() => return Ok(StreamOutcome::Cancelled),
            _ = tokio::time::sleep_until(deadline) => return Err(GenerationError::Timeout(timeout_secs)),
            response = self.post(&url, &body) => response?,
        };

        let mut stream = Box::pin(response.bytes_stream());
        let mut decoder = SseDecoder::default();
        let mut delivered = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = abort.aborted() => {
                    log::info!("[gemini] Stream cancelled after {} chunks", delivered);
                    return Ok(StreamOutcome::Cancelled);
                }
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(GenerationError::Timeout(timeout_secs));
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    for payload in decoder.push(&bytes) {
                        let text = parse_stream_payload(&payload)?;
                        if !text.is_empty() {
                            on_chunk(&text);
                            delivered += 1;
                        }
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            }
        }

        if let Some(payload) = decoder.finish() {
            let text = parse_stream_payload(&payload)?;
            if !text.is_empty() {
                on_chunk(&text);
                delivered += 1;
            }
        }

        log::info!("[gemini] Stream completed ({} chunks)", delivered);
        Ok(StreamOutcome::Completed)
    }

    async fn transcribe_audio(&self, audio: InlineBlob) -> Result<String, GenerationError> {
        log::info!("[gemini] Transcribing {} audio", audio.mime_type);
        let body = GenerateRequest::user(vec![Part::blob(audio), Part::text(TRANSCRIBE_INSTRUCTION)]);
        let response = self.generate_once(TRANSCRIBE_MODEL, body).await?;
        Ok(response.text())
    }

    async fn edit(&self, image: InlineBlob, instruction: String) -> Result<InlineBlob, GenerationError> {
        log::info!("[gemini] Editing {} image", image.mime_type);
        let body = GenerateRequest::user(vec![Part::blob(image), Part::text(instruction)]);
        let response = self.generate_once(IMAGE_EDIT_MODEL, body).await?;
        extract_image(&response)
    }
}

fn extract_image(response: &GenerateResponse) -> Result<InlineBlob, GenerationError> {
    response
        .first_image()
        .ok_or_else(|| GenerationError::Content("No image generated".to_string()))
}

impl GenerationClient for GeminiClient {
    fn is_configured(&self) -> bool {
        self.has_api_key()
    }

    fn stream_completion<'a>(
        &'a self,
        request: CompletionRequest,
        on_chunk: ChunkSink<'a>,
        abort: AbortSignal,
    ) -> BoxFuture<'a, Result<StreamOutcome, GenerationError>> {
        self.stream_guide(request, on_chunk, abort).boxed()
    }

    fn transcribe<'a>(&'a self, audio: InlineBlob) -> BoxFuture<'a, Result<String, GenerationError>> {
        self.transcribe_audio(audio).boxed()
    }

    fn edit_image<'a>(
        &'a self,
        image: InlineBlob,
        instruction: String,
    ) -> BoxFuture<'a, Result<InlineBlob, GenerationError>> {
        self.edit(image, instruction).boxed()
    }
}
