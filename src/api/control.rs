//! Assistant control endpoints
//!
//! Action endpoints reply with the resulting status. While the scan loop is
//! running the reply arrives after the current iteration finishes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::assistant::{Action, DisplayState, Mode, Status};

/// Build control router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/frame", get(frame))
        .route("/audio", get(audio))
        .route("/listen", post(listen))
        .route("/utterance", post(utterance))
        .route("/mode", post(set_mode))
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/alert", post(alert))
        .route("/guardian", put(set_guardian))
        .with_state(state)
}

/// Current display snapshot
async fn status(State(state): State<Arc<ApiState>>) -> Json<DisplayState> {
    Json(state.controller.display())
}

/// Most recent captured frame
async fn frame(State(state): State<Arc<ApiState>>) -> Result<Response, ControlError> {
    let frame = state
        .controller
        .display()
        .frame
        .ok_or(ControlError::NotFound("no frame captured yet"))?;

    Ok((
        [(header::CONTENT_TYPE, frame.mime_type())],
        frame.data().to_vec(),
    )
        .into_response())
}

/// Most recent narration audio
async fn audio(State(state): State<Arc<ApiState>>) -> Result<Response, ControlError> {
    let path = state
        .controller
        .display()
        .artifact
        .ok_or(ControlError::NotFound("no narration audio yet"))?;

    // A newer narration may already have replaced the file
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ControlError::NotFound("narration audio no longer available"))?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response())
}

async fn listen(State(state): State<Arc<ApiState>>) -> Result<Json<Status>, ControlError> {
    dispatch(&state, Action::Listen).await
}

/// Typed utterance request
#[derive(Debug, Deserialize)]
pub struct UtteranceRequest {
    pub text: String,
}

async fn utterance(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<UtteranceRequest>,
) -> Result<Json<Status>, ControlError> {
    if request.text.trim().is_empty() {
        return Err(ControlError::BadRequest("text must not be empty".to_string()));
    }
    dispatch(&state, Action::Utterance(request.text)).await
}

/// Explicit mode change request
#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    /// Short name ("reading") or label ("Reading Mode (Text/Medicine)")
    pub mode: String,
    #[serde(default)]
    pub target: Option<String>,
}

async fn set_mode(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ModeRequest>,
) -> Result<Json<Status>, ControlError> {
    let mode: Mode = request
        .mode
        .parse()
        .map_err(|e: crate::Error| ControlError::BadRequest(e.to_string()))?;

    let target = request.target.map(|t| t.trim().to_string());
    dispatch(&state, Action::SetMode { mode, target }).await
}

async fn start(State(state): State<Arc<ApiState>>) -> Result<Json<Status>, ControlError> {
    dispatch(&state, Action::Start).await
}

async fn stop(State(state): State<Arc<ApiState>>) -> Result<Json<Status>, ControlError> {
    dispatch(&state, Action::Stop).await
}

async fn alert(State(state): State<Arc<ApiState>>) -> Result<Json<Status>, ControlError> {
    dispatch(&state, Action::Alert).await
}

/// Guardian contact update
#[derive(Debug, Deserialize)]
pub struct GuardianRequest {
    pub contact: String,
}

async fn set_guardian(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<GuardianRequest>,
) -> Result<Json<Status>, ControlError> {
    if request.contact.trim().is_empty() {
        return Err(ControlError::BadRequest(
            "contact must not be empty".to_string(),
        ));
    }
    dispatch(&state, Action::SetGuardian(request.contact)).await
}

async fn dispatch(state: &ApiState, action: Action) -> Result<Json<Status>, ControlError> {
    state
        .controller
        .send(action)
        .await
        .map(Json)
        .map_err(|e| ControlError::Unavailable(e.to_string()))
}

/// Control API errors
#[derive(Debug)]
pub enum ControlError {
    NotFound(&'static str),
    BadRequest(String),
    Unavailable(String),
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
