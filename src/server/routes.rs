// REST API routes for the local HTTP server
// Thin wrappers over the command layer; errors map onto HTTP status codes.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ai::{InlineBlob, ToolTemplate, BUILTIN_TOOLS};
use crate::commands::{
    self, export, generation, history, settings, templates, AppState, CommandError,
    StatusResponse,
};
use crate::conversation::Message;
use crate::export::ExportFormat;
use crate::store::{CustomTheme, Preferences, PreferencesPatch, ShortcutAction, Template, ThemeSelection};

type ApiResult<T> = Result<Json<T>, CommandError>;

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = match &self {
            CommandError::Invalid(_) => StatusCode::BAD_REQUEST,
            CommandError::NotFound(_) => StatusCode::NOT_FOUND,
            CommandError::Busy => StatusCode::CONFLICT,
            CommandError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CommandError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("[server] {} {}", status.as_u16(), self);
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

// ---- Request/Response types ----

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Deserialize)]
pub struct TranscribeRequest {
    pub audio: InlineBlob,
}

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

#[derive(Deserialize)]
pub struct EditImageRequest {
    pub image: InlineBlob,
    pub instruction: String,
}

#[derive(Serialize)]
pub struct EditImageResponse {
    pub image: InlineBlob,
}

#[derive(Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub format: ExportFormat,
}

// ---- Route registration ----

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/status", get(get_status))
        .route(
            "/api/preferences",
            get(get_preferences)
                .patch(update_preferences)
                .delete(reset_preferences),
        )
        .route("/api/generate/cancel", post(cancel_generation))
        .route("/api/tools", get(list_tools))
        .route("/api/transcribe", post(transcribe))
        .route("/api/edit-image", post(edit_image))
        .route("/api/history", get(get_history).delete(clear_history))
        .route("/api/history/undo", post(undo))
        .route("/api/history/redo", post(redo))
        .route("/api/response", get(get_response))
        .route("/api/templates", get(list_templates).post(save_template))
        .route("/api/templates/{id}", delete(delete_template))
        .route("/api/theme", get(get_theme).put(set_theme))
        .route(
            "/api/themes/custom",
            get(list_custom_themes).post(add_custom_theme),
        )
        .route("/api/themes/custom/{id}", delete(delete_custom_theme))
        .route(
            "/api/shortcuts",
            get(get_shortcuts).put(set_shortcut).delete(reset_shortcuts),
        )
        .route("/api/export", get(export_response))
}

// ---- Handlers ----

async fn get_status(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    commands::get_status(&state).map(Json)
}

async fn get_preferences(State(state): State<Arc<AppState>>) -> ApiResult<Preferences> {
    settings::get_preferences(&state).map(Json)
}

async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<PreferencesPatch>,
) -> ApiResult<Preferences> {
    settings::update_preferences(&state, patch).map(Json)
}

async fn reset_preferences(State(state): State<Arc<AppState>>) -> ApiResult<Preferences> {
    settings::reset_preferences(&state).map(Json)
}

async fn cancel_generation(State(state): State<Arc<AppState>>) -> ApiResult<CancelResponse> {
    let cancelled = generation::cancel(&state)?;
    Ok(Json(CancelResponse { cancelled }))
}

async fn list_tools() -> Json<Vec<&'static ToolTemplate>> {
    Json(BUILTIN_TOOLS.iter().collect())
}

async fn transcribe(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TranscribeRequest>,
) -> ApiResult<TranscribeResponse> {
    let text = generation::transcribe(&state, body.audio).await?;
    Ok(Json(TranscribeResponse { text }))
}

async fn edit_image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EditImageRequest>,
) -> ApiResult<EditImageResponse> {
    let image = generation::edit_image(&state, body.image, body.instruction).await?;
    Ok(Json(EditImageResponse { image }))
}

async fn get_history(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Message>> {
    history::get_history(&state).map(Json)
}

async fn clear_history(State(state): State<Arc<AppState>>) -> ApiResult<history::ResponseView> {
    history::clear_history(&state).map(Json)
}

async fn undo(State(state): State<Arc<AppState>>) -> ApiResult<history::ResponseView> {
    history::undo(&state).map(Json)
}

async fn redo(State(state): State<Arc<AppState>>) -> ApiResult<history::ResponseView> {
    history::redo(&state).map(Json)
}

async fn get_response(State(state): State<Arc<AppState>>) -> ApiResult<history::ResponseView> {
    history::get_response(&state).map(Json)
}

async fn list_templates(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Template>> {
    templates::list_templates(&state).map(Json)
}

async fn save_template(
    State(state): State<Arc<AppState>>,
    Json(body): Json<templates::NewTemplate>,
) -> Result<(StatusCode, Json<Template>), CommandError> {
    let saved = templates::save_template(&state, body)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, CommandError> {
    templates::delete_template(&state, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_theme(State(state): State<Arc<AppState>>) -> ApiResult<settings::ThemeState> {
    settings::get_theme(&state).map(Json)
}

async fn set_theme(
    State(state): State<Arc<AppState>>,
    Json(selection): Json<ThemeSelection>,
) -> ApiResult<settings::ThemeState> {
    settings::set_theme(&state, selection).map(Json)
}

async fn list_custom_themes(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CustomTheme>> {
    settings::list_custom_themes(&state).map(Json)
}

async fn add_custom_theme(
    State(state): State<Arc<AppState>>,
    Json(body): Json<settings::NewCustomTheme>,
) -> Result<(StatusCode, Json<CustomTheme>), CommandError> {
    let created = settings::add_custom_theme(&state, body)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_custom_theme(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, CommandError> {
    settings::delete_custom_theme(&state, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_shortcuts(
    State(state): State<Arc<AppState>>,
) -> ApiResult<BTreeMap<ShortcutAction, String>> {
    settings::get_shortcuts(&state).map(Json)
}

async fn set_shortcut(
    State(state): State<Arc<AppState>>,
    Json(binding): Json<settings::ShortcutBinding>,
) -> ApiResult<BTreeMap<ShortcutAction, String>> {
    settings::set_shortcut(&state, binding).map(Json)
}

async fn reset_shortcuts(
    State(state): State<Arc<AppState>>,
) -> ApiResult<BTreeMap<ShortcutAction, String>> {
    settings::reset_shortcuts(&state).map(Json)
}

async fn export_response(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportParams>,
) -> Result<Response, CommandError> {
    let doc = export::export_response(&state, params.format)?;
    let disposition = format!("attachment; filename=\"{}\"", doc.filename);
    Ok((
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        doc.body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (CommandError::Invalid("bad".into()), StatusCode::BAD_REQUEST),
            (CommandError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (CommandError::Busy, StatusCode::CONFLICT),
            (CommandError::Upstream("api".into()), StatusCode::BAD_GATEWAY),
            (CommandError::Internal("lock".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
