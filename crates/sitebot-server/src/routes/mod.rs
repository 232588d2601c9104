pub mod chatbots;
pub mod leads;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/chatbots", chatbots::router())
        .nest("/sessions", sessions::router())
        .nest("/leads", leads::router())
}
