use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use sitebot_core::{Chatbot, MemoryStore, SessionContext, Settings};
use sitebot_provider::{Completion, CompletionClient};

/// Shared application state accessible from all route handlers.
///
/// The registry and session maps sit behind async mutexes: one logical
/// visitor action runs at a time, which is all this design promises.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<MemoryStore>,
    /// Initialized chatbots keyed by company slug.
    pub registry: Arc<Mutex<HashMap<String, Chatbot>>>,
    pub sessions: Arc<Mutex<HashMap<String, SessionContext>>>,
    pub completion: Arc<dyn Completion>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let completion = CompletionClient::with_base(
            settings.api_key.clone(),
            settings.api_base.clone(),
            settings.model.clone(),
        );
        Self::with_completion(settings, Arc::new(completion))
    }

    /// State with an injected completion backend, for tests.
    pub fn with_completion(settings: Settings, completion: Arc<dyn Completion>) -> Self {
        Self {
            settings,
            store: Arc::new(MemoryStore::new()),
            registry: Arc::new(Mutex::new(HashMap::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            completion,
        }
    }
}
