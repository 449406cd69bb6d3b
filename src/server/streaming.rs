// SSE streaming of generations for the local HTTP server
// - `chunk` events carry raw text fragments in arrival order
// - exactly one terminal event: `done`, `cancelled` or `error`
// - the generation is aborted when the client disconnects
// - validation and busy errors are returned as plain HTTP errors before the stream opens

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, KeepAliveStream, Sse},
    routing::post,
    Json, Router,
};
use futures::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::ai::{AbortSignal, Modifier, StreamOutcome, ToolParams};
use crate::commands::generation::{self, GenerateRequest, PendingGeneration};
use crate::commands::{AppState, CommandError};

type GenerationEvents = Box<dyn Stream<Item = Result<Event, Infallible>> + Send + Unpin>;
type EventStream = Sse<KeepAliveStream<GenerationEvents>>;

#[derive(Deserialize)]
pub struct RegenerateRequest {
    pub modifier: Modifier,
}

pub fn stream_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/regenerate", post(regenerate))
        .route("/api/tools/{id}/generate", post(generate_tool))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> Result<EventStream, CommandError> {
    let pending = generation::begin_generate(&state, body)?;
    Ok(stream_generation(state, pending))
}

async fn regenerate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegenerateRequest>,
) -> Result<EventStream, CommandError> {
    let pending = generation::begin_regenerate(&state, body.modifier)?;
    Ok(stream_generation(state, pending))
}

async fn generate_tool(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(params): Json<ToolParams>,
) -> Result<EventStream, CommandError> {
    let pending = generation::begin_tool(&state, &id, &params)?;
    Ok(stream_generation(state, pending))
}

/// Aborts the generation when the SSE body is dropped, which is how a
/// client disconnect shows up.
struct AbortOnDrop(AbortSignal);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn stream_generation(state: Arc<AppState>, pending: PendingGeneration) -> EventStream {
    Sse::new(generation_events(state, pending)).keep_alive(KeepAlive::default())
}

/// Run the generation on its own task and forward its events. Dropping the
/// returned stream aborts the generation.
fn generation_events(state: Arc<AppState>, pending: PendingGeneration) -> GenerationEvents {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let abort = pending.abort_signal();
    let on_disconnect = AbortOnDrop(abort.clone());

    tokio::spawn(async move {
        let chunk_tx = tx.clone();
        let result = generation::run(&state, pending, move |chunk| {
            // SSE cannot carry bare carriage returns
            let event = Event::default().event("chunk").data(chunk.replace('\r', ""));
            if chunk_tx.send(event).is_err() {
                abort.abort();
            }
        })
        .await;

        let terminal = match result {
            Ok(done) => {
                let name = match done.outcome {
                    StreamOutcome::Completed => "done",
                    StreamOutcome::Cancelled => "cancelled",
                };
                Event::default()
                    .event(name)
                    .json_data(&done)
                    .unwrap_or_else(|_| Event::default().event(name))
            }
            Err(e) => Event::default().event("error").data(e.to_string().replace('\r', "")),
        };
        let _ = tx.send(terminal);
    });

    let stream = UnboundedReceiverStream::new(rx).map(move |event| {
        let _ = &on_disconnect;
        Ok::<_, Infallible>(event)
    });
    Box::new(stream)
}

#[cfg(test)]
mod tests {
    use super::generation_events;
    use crate::commands::generation::{begin_generate, GenerateRequest};
    use crate::commands::testing::{state_with, FakeClient};
    use crate::server::{start_server, RunningServer};
    use reqwest::StatusCode;
    use serde_json::json;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    async fn post(server: &RunningServer, path: &str, body: serde_json::Value) -> (StatusCode, String) {
        let response = reqwest::Client::new()
            .post(format!("http://{}{}", server.addr, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.text().await.unwrap())
    }

    #[tokio::test]
    async fn test_generate_streams_chunks_then_done() {
        let (state, _) = state_with(FakeClient::streaming(&["Hello ", "world"]));
        let server = start_server(state.clone(), 0).await.unwrap();

        let (status, body) = post(&server, "/api/generate", json!({ "text": "Make a pad" })).await;
        assert_eq!(status, StatusCode::OK);

        let hello = body.find("data: Hello ").unwrap();
        let world = body.find("data: world").unwrap();
        let done = body.find("event: done").unwrap();
        assert!(hello < world && world < done);
        assert!(body.contains("event: chunk"));
        assert!(body.contains(r#""text":"Hello world""#));
        assert_eq!(state.lock().unwrap().response, "Hello world");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_validation_and_busy_are_plain_http_errors() {
        let (state, _) = state_with(FakeClient::default());
        let server = start_server(state.clone(), 0).await.unwrap();

        let (status, body) = post(&server, "/api/generate", json!({ "text": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("\"error\""));

        let (status, _) = post(&server, "/api/tools/theremin/generate", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        state.lock().unwrap().in_flight = Some(crate::ai::AbortSignal::new());
        let (status, _) = post(&server, "/api/generate", json!({ "text": "Bass" })).await;
        assert_eq!(status, StatusCode::CONFLICT);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_error_event() {
        let (state, _) = state_with(FakeClient {
            fail_stream: true,
            ..Default::default()
        });
        let server = start_server(state.clone(), 0).await.unwrap();

        let (status, body) = post(&server, "/api/generate", json!({ "text": "Bass" })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("event: error"));
        assert!(body.contains("upstream exploded"));
        assert!(!state.lock().unwrap().is_generating());

        server.stop().await;
    }

    #[tokio::test]
    async fn test_dropping_the_event_stream_cancels_the_generation() {
        let (state, _) = state_with(FakeClient {
            chunks: vec!["Step 1".to_string()],
            hang_until_aborted: true,
            ..Default::default()
        });
        let pending = begin_generate(
            &state,
            GenerateRequest {
                text: "Pad".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let mut events = generation_events(state.clone(), pending);
        assert!(events.next().await.is_some());
        assert_eq!(state.lock().unwrap().response, "Step 1");
        drop(events);

        for _ in 0..200 {
            if !state.lock().unwrap().is_generating() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let ws = state.lock().unwrap();
        assert!(!ws.is_generating());
        // Cancelled runs keep their partial text and are not logged
        assert_eq!(ws.response, "Step 1");
        assert!(ws.log.is_empty());
    }
}
