use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sitebot_core::{generate_chatbot_id, generate_embed_code, Chatbot, LeadStore};
use sitebot_schema::{company_slug, ChatbotConfig, ContactInfo};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateChatbotRequest {
    pub company_name: String,
    pub website_url: String,
}

#[derive(Serialize)]
pub struct ChatbotSummary {
    pub chatbot_id: String,
    pub slug: String,
    pub company_name: String,
    pub website_url: String,
    pub ready: bool,
    pub page_count: usize,
    pub contact_info: ContactInfo,
    pub embed_code: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_chatbots).post(create_chatbot))
        .route("/{id}", get(get_chatbot).delete(delete_chatbot))
}

/// Create a chatbot: scrape the website, register the instance under its
/// company slug and persist its config + embed snippet.
async fn create_chatbot(
    State(state): State<AppState>,
    Json(req): Json<CreateChatbotRequest>,
) -> Result<Json<ChatbotSummary>, StatusCode> {
    let company_name = req.company_name.trim().to_string();
    let website_url = req.website_url.trim().to_string();
    if company_name.is_empty() || website_url.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let chatbot_id = generate_chatbot_id(&company_name, &website_url);
    let mut bot = Chatbot::new(&company_name, &website_url, &chatbot_id);
    if let Err(err) = bot.initialize(None).await {
        warn!(%err, company = %company_name, "chatbot creation failed");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let embed_code = generate_embed_code(&chatbot_id, &company_name);
    if let Err(err) = state
        .store
        .save_chatbot(&chatbot_id, &company_name, &website_url, &embed_code)
    {
        warn!(%err, "failed to persist chatbot config");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let slug = company_slug(&company_name);
    let summary = ChatbotSummary {
        chatbot_id,
        slug: slug.clone(),
        company_name,
        website_url,
        ready: bot.is_ready(),
        page_count: bot.pages().len(),
        contact_info: bot.contact_info().clone(),
        embed_code,
    };

    state.registry.lock().await.insert(slug, bot);
    info!(slug = %summary.slug, pages = summary.page_count, "chatbot registered");
    Ok(Json(summary))
}

async fn list_chatbots(State(state): State<AppState>) -> Json<Vec<ChatbotConfig>> {
    Json(state.store.list_chatbots())
}

async fn get_chatbot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatbotConfig>, StatusCode> {
    state
        .store
        .get_chatbot(&id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Drop a chatbot from the live registry. Sessions that had it current lose
/// their selection; the stored config stays queryable.
async fn delete_chatbot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut sessions = state.sessions.lock().await;
    let mut registry = state.registry.lock().await;

    let slug = registry
        .iter()
        .find(|(_, bot)| bot.chatbot_id == id)
        .map(|(slug, _)| slug.clone())
        .ok_or(StatusCode::NOT_FOUND)?;
    registry.remove(&slug);

    for session in sessions.values_mut() {
        if session.current.as_deref() == Some(slug.as_str()) {
            session.clear_current();
        }
    }

    info!(%slug, "chatbot removed from registry");
    Ok(StatusCode::NO_CONTENT)
}
