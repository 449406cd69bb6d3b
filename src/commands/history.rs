// Commands for the conversation log and the current response buffer.

use super::{AppState, CommandError, CommandResult, Workspace};
use crate::classify::{classify, VisualTag};
use crate::conversation::Message;
use serde::Serialize;
use std::collections::BTreeSet;

/// The guide currently on screen plus what the UI needs around it.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseView {
    pub text: String,
    pub tags: BTreeSet<VisualTag>,
    pub generating: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// True when the screen shows text the log does not hold, e.g. the partial
/// output of a cancelled generation.
fn has_unlogged_text(ws: &Workspace) -> bool {
    ws.response != ws.log.active_response()
}

impl ResponseView {
    fn of(ws: &Workspace) -> Self {
        ResponseView {
            text: ws.response.clone(),
            tags: classify(&ws.response),
            generating: ws.is_generating(),
            can_undo: ws.log.can_undo() || has_unlogged_text(ws),
            can_redo: ws.log.can_redo(),
        }
    }
}

pub fn get_response(state: &AppState) -> CommandResult<ResponseView> {
    Ok(ResponseView::of(&*state.lock()?))
}

/// Log entries, most recent first.
pub fn get_history(state: &AppState) -> CommandResult<Vec<Message>> {
    Ok(state.lock()?.log.entries().to_vec())
}

pub fn clear_history(state: &AppState) -> CommandResult<ResponseView> {
    let mut ws = state.lock()?;
    if ws.is_generating() {
        return Err(CommandError::Busy);
    }
    ws.log.reset();
    ws.response.clear();
    Ok(ResponseView::of(&ws))
}

/// Step back one exchange. Unlogged text on screen is discarded first,
/// which brings back the newest logged guide. With fewer than two entries
/// and nothing unlogged, nothing changes.
pub fn undo(state: &AppState) -> CommandResult<ResponseView> {
    let mut ws = state.lock()?;
    if ws.is_generating() {
        return Err(CommandError::Busy);
    }
    if has_unlogged_text(&ws) {
        ws.response = ws.log.active_response();
    } else if let Some(active) = ws.log.undo() {
        ws.response = active;
    }
    Ok(ResponseView::of(&ws))
}

pub fn redo(state: &AppState) -> CommandResult<ResponseView> {
    let mut ws = state.lock()?;
    if ws.is_generating() {
        return Err(CommandError::Busy);
    }
    if let Some(active) = ws.log.redo() {
        ws.response = active;
    }
    Ok(ResponseView::of(&ws))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StreamOutcome;
    use crate::commands::generation::{cancel, generate, GenerateRequest, GenerationResult};
    use crate::commands::testing::{state_with, FakeClient};
    use std::sync::Arc;
    use std::time::Duration;

    async fn generate_text(state: &AppState, text: &str) {
        generate(
            state,
            GenerateRequest {
                text: text.to_string(),
                ..Default::default()
            },
            |_| {},
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_undo_redo_restore_response_buffer() {
        let (state, _) = state_with(FakeClient::streaming(&["Use **Glue Compressor**"]));
        generate_text(&state, "first").await;
        generate_text(&state, "second").await;
        assert_eq!(get_history(&state).unwrap().len(), 4);

        let view = undo(&state).unwrap();
        assert_eq!(view.text, "Use **Glue Compressor**");
        assert!(view.can_redo);
        assert!(view.tags.contains(&VisualTag::Dynamics));
        assert_eq!(get_history(&state).unwrap().len(), 2);

        let view = undo(&state).unwrap();
        assert_eq!(view.text, "");
        assert!(!view.can_undo);

        let view = redo(&state).unwrap();
        assert_eq!(view.text, "Use **Glue Compressor**");
        assert_eq!(get_response(&state).unwrap().text, view.text);
    }

    #[test]
    fn test_undo_on_empty_log_is_noop() {
        let (state, _) = state_with(FakeClient::default());

        let view = undo(&state).unwrap();
        assert_eq!(view.text, "");
        assert!(!view.can_undo);
        assert!(!view.can_redo);
    }

    /// Log [one -> "A", two -> "B"] with "B" on screen.
    fn two_guides(client: FakeClient) -> Arc<AppState> {
        let (state, _) = state_with(client);
        {
            let mut ws = state.lock().unwrap();
            ws.log.record_exchange(Message::user("one", None), Message::model("A"));
            ws.log.record_exchange(Message::user("two", None), Message::model("B"));
            ws.response = "B".to_string();
        }
        state
    }

    async fn wait_until(state: &AppState, ready: impl Fn(&Workspace) -> bool) {
        for _ in 0..200 {
            let done = {
                let ws = state.lock().unwrap();
                ready(&*ws)
            };
            if done {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("workspace never reached the expected state");
    }

    async fn start_third(state: &Arc<AppState>) -> tokio::task::JoinHandle<CommandResult<GenerationResult>> {
        let state = Arc::clone(state);
        tokio::spawn(async move {
            generate(
                &state,
                GenerateRequest {
                    text: "three".to_string(),
                    ..Default::default()
                },
                |_| {},
            )
            .await
        })
    }

    #[tokio::test]
    async fn test_cancel_before_first_chunk_keeps_previous_guide() {
        let state = two_guides(FakeClient {
            hang_until_aborted: true,
            ..Default::default()
        });

        let running = start_third(&state).await;
        wait_until(&state, |ws| ws.is_generating()).await;
        cancel(&state).unwrap();
        let result = running.await.unwrap().unwrap();
        assert_eq!(result.outcome, StreamOutcome::Cancelled);

        let view = get_response(&state).unwrap();
        assert_eq!(view.text, "B");
        assert_eq!(get_history(&state).unwrap().len(), 4);

        // Nothing unlogged on screen, so undo steps back a whole exchange
        assert_eq!(undo(&state).unwrap().text, "A");
    }

    #[tokio::test]
    async fn test_undo_after_cancel_drops_partial_text_first() {
        let state = two_guides(FakeClient {
            chunks: vec!["par".to_string()],
            hang_until_aborted: true,
            ..Default::default()
        });

        let running = start_third(&state).await;
        wait_until(&state, |ws| ws.response == "par").await;
        cancel(&state).unwrap();
        running.await.unwrap().unwrap();

        let view = get_response(&state).unwrap();
        assert_eq!(view.text, "par");
        assert!(view.can_undo);

        let view = undo(&state).unwrap();
        assert_eq!(view.text, "B");
        assert_eq!(get_history(&state).unwrap().len(), 4);
        assert!(!view.can_redo);

        assert_eq!(undo(&state).unwrap().text, "A");
        assert_eq!(redo(&state).unwrap().text, "B");
    }

    #[tokio::test]
    async fn test_clear_history() {
        let (state, _) = state_with(FakeClient::streaming(&["guide"]));
        generate_text(&state, "pad").await;

        let view = clear_history(&state).unwrap();
        assert_eq!(view.text, "");
        assert!(get_history(&state).unwrap().is_empty());
    }
}
