//! Completion client for the OpenRouter chat-completions API.
//!
//! The client surface is infallible: every failure mode collapses to a
//! user-facing string, so callers never branch on errors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "arcee-ai/trinity-large-preview:free";

const MAX_COMPLETION_TOKENS: u32 = 400;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const REFERER: &str = "http://localhost:8080";
const APP_TITLE: &str = "sitebot lead generator";
const CACHE_KEY_LEN: usize = 12;
const ERROR_BODY_PREVIEW_CHARS: usize = 100;

pub const MISSING_KEY_MESSAGE: &str =
    "API key not set. Please configure OPENROUTER_API_KEY.";
pub const CONNECTIVITY_MESSAGE: &str =
    "I'm having connection issues. Please try again.";
const AUTH_FAILED_MESSAGE: &str =
    "API authentication failed. Please check that your OPENROUTER_API_KEY is valid.";
const NO_CREDITS_MESSAGE: &str =
    "Insufficient credits. Please add credits to your OpenRouter account.";
const RATE_LIMITED_MESSAGE: &str =
    "Rate limit exceeded. Please try again in a moment.";

/// Seam for the chat engine: anything that can answer a prompt.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> String;
}

pub struct CompletionClient {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    cache: Mutex<HashMap<String, String>>,
}

impl CompletionClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base(api_key, OPENROUTER_API_BASE, DEFAULT_MODEL)
    }

    pub fn with_base(
        api_key: Option<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.cache.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[async_trait]
impl Completion for CompletionClient {
    async fn complete(&self, prompt: &str) -> String {
        let Some(api_key) = &self.api_key else {
            return MISSING_KEY_MESSAGE.to_string();
        };

        let key = cache_key(prompt);
        if let Some(hit) = self.cache().get(&key) {
            debug!("prompt cache hit");
            return hit.clone();
        }

        let url = format!("{}/chat/completions", self.api_base);
        let payload = ApiRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let resp = match self
            .client
            .post(url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                // Transport failures are transient; deliberately not cached.
                warn!(%err, "completion transport failure");
                return CONNECTIVITY_MESSAGE.to_string();
            }
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%err, "failed to read completion response body");
                return CONNECTIVITY_MESSAGE.to_string();
            }
        };

        let answer = if status == StatusCode::OK {
            match serde_json::from_str::<ApiResponse>(&body) {
                Ok(api) if !api.choices.is_empty() => {
                    api.choices[0].message.content.trim().to_string()
                }
                _ => status_message(status, &body),
            }
        } else {
            warn!(%status, "completion api returned error status");
            status_message(status, &body)
        };

        // Status-derived messages land in the cache alongside real answers;
        // the map is unbounded for the process lifetime.
        self.cache().insert(key, answer.clone());
        answer
    }
}

fn cache_key(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(CACHE_KEY_LEN);
    key
}

fn status_message(status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        401 => AUTH_FAILED_MESSAGE.to_string(),
        402 => NO_CREDITS_MESSAGE.to_string(),
        429 => RATE_LIMITED_MESSAGE.to_string(),
        code => {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            format!("API Error {code}: {preview}")
        }
    }
}

/// Canned-answer backend for tests; counts how often it is consulted.
#[derive(Default)]
pub struct StubCompletion {
    reply: String,
    calls: AtomicUsize,
}

impl StubCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Completion for StubCompletion {
    async fn complete(&self, _prompt: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiRequest {
    pub model: String,
    pub messages: Vec<ApiMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub choices: Vec<ApiChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiChoice {
    pub message: ApiAssistantMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiAssistantMessage {
    #[serde(default)]
    pub content: String,
}
