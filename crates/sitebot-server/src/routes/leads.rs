use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use sitebot_core::LeadStore;
use sitebot_schema::LeadRecord;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct LeadQuery {
    pub chatbot_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_leads))
}

async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<LeadQuery>,
) -> Json<Vec<LeadRecord>> {
    Json(state.store.get_leads(query.chatbot_id.as_deref()))
}
