use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sitebot_core::{
    handle_form_action, handle_message, CaptureState, FormAction, FormError, SessionContext,
    StepOutcome, FORM_PENDING_MESSAGE,
};

use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct SelectChatbotRequest {
    pub slug: String,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub reply: String,
    /// The visitor must finish the lead form before chatting further.
    pub form_pending: bool,
    pub capture_started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_prompt: Option<String>,
}

#[derive(Serialize)]
pub struct LeadFormResponse {
    pub state: CaptureState,
    pub captured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}/select", post(select_chatbot))
        .route("/{id}/messages", post(post_message))
        .route("/{id}/lead", post(post_lead_action))
}

async fn create_session(State(state): State<AppState>) -> Json<SessionCreated> {
    let session = SessionContext::new();
    let session_id = session.session_id.clone();
    state
        .sessions
        .lock()
        .await
        .insert(session_id.clone(), session);
    Json(SessionCreated { session_id })
}

/// Make a registered chatbot current for the session, resetting the
/// conversation and any half-finished lead form.
async fn select_chatbot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SelectChatbotRequest>,
) -> Result<StatusCode, StatusCode> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    if !state.registry.lock().await.contains_key(&req.slug) {
        return Err(StatusCode::NOT_FOUND);
    }

    session.switch_chatbot(req.slug);
    Ok(StatusCode::NO_CONTENT)
}

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, StatusCode> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let slug = session.current.clone().ok_or(StatusCode::BAD_REQUEST)?;

    if session.capture.is_capturing() {
        debug!(session = %id, "message refused while the lead form is open");
        return Ok(Json(MessageResponse {
            reply: FORM_PENDING_MESSAGE.to_string(),
            form_pending: true,
            capture_started: false,
            form_prompt: session.capture.prompt().map(str::to_string),
        }));
    }

    let registry = state.registry.lock().await;
    let chatbot = registry.get(&slug).ok_or(StatusCode::NOT_FOUND)?;

    let reply = handle_message(session, chatbot, &req.text, state.completion.as_ref()).await;
    let form_prompt = reply
        .capture_started
        .then(|| session.capture.prompt().map(str::to_string))
        .flatten();

    Ok(Json(MessageResponse {
        reply: reply.answer,
        form_pending: false,
        capture_started: reply.capture_started,
        form_prompt,
    }))
}

async fn post_lead_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(action): Json<FormAction>,
) -> Result<Json<LeadFormResponse>, StatusCode> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let slug = session.current.clone().ok_or(StatusCode::BAD_REQUEST)?;

    let registry = state.registry.lock().await;
    let chatbot = registry.get(&slug).ok_or(StatusCode::NOT_FOUND)?;

    match handle_form_action(session, chatbot, action, state.store.as_ref()) {
        Ok(StepOutcome::Next(next)) => Ok(Json(LeadFormResponse {
            state: next,
            captured: false,
            lead_id: None,
            prompt: session.capture.prompt().map(str::to_string),
            error: None,
        })),
        Ok(StepOutcome::Captured { lead_id }) => Ok(Json(LeadFormResponse {
            state: session.capture.state(),
            captured: true,
            lead_id: Some(lead_id),
            prompt: None,
            error: None,
        })),
        Err(FormError::NotCapturing) => Err(StatusCode::CONFLICT),
        // Validation and storage failures keep the step; the visitor retries.
        Err(err) => Ok(Json(LeadFormResponse {
            state: session.capture.state(),
            captured: false,
            lead_id: None,
            prompt: session.capture.prompt().map(str::to_string),
            error: Some(err.to_string()),
        })),
    }
}
