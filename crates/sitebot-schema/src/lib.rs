use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successfully scraped page: the fetched URL plus the readable text
/// kept from it (line-filtered and truncated by the scraper).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapedPage {
    pub url: String,
    pub content: String,
}

/// Contact details mined from the scraped text. Both lists are deduplicated
/// in first-seen order and capped at three entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactInfo {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single turn of the visitor conversation. Turns alternate starting with
/// the user; the input flow is the only thing guaranteeing that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A captured lead: visitor contact details plus the conversation context
/// that produced them. Append-only; never mutated after creation.
/// `ended_at` is the capture instant, not the end of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub chatbot_id: String,
    pub company_name: String,
    pub session_id: String,
    pub questions_asked: u32,
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Stored chatbot registration: identity, source website and the embed
/// snippet generated for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotConfig {
    pub id: u64,
    pub chatbot_id: String,
    pub company_name: String,
    pub website_url: String,
    pub embed_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derive the registry slug for a company name: lowercase, with every run
/// of non-alphanumeric characters collapsed to a single `-`.
pub fn company_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}
