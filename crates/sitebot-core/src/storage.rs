use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use sitebot_schema::{ChatbotConfig, ConversationTurn, LeadRecord};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Everything needed to persist a lead; the store assigns the id and the
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub chatbot_id: String,
    pub company_name: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub session_id: String,
    pub questions_asked: u32,
    pub conversation: Vec<ConversationTurn>,
}

/// Storage collaborator consumed by the core. In-memory today; the trait is
/// the seam a real backend would implement.
pub trait LeadStore: Send + Sync {
    fn save_lead(&self, lead: NewLead) -> Result<u64, StorageError>;
    fn get_leads(&self, chatbot_id: Option<&str>) -> Vec<LeadRecord>;
    fn save_chatbot(
        &self,
        chatbot_id: &str,
        company_name: &str,
        website_url: &str,
        embed_code: &str,
    ) -> Result<(), StorageError>;
    fn get_chatbot(&self, chatbot_id: &str) -> Option<ChatbotConfig>;
}

#[derive(Default)]
struct StoreInner {
    leads: Vec<LeadRecord>,
    chatbots: HashMap<String, ChatbotConfig>,
    next_lead_id: u64,
    next_chatbot_id: u64,
}

/// Process-lifetime storage: an append-only lead list plus a chatbot
/// registry. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl LeadStore for MemoryStore {
    fn save_lead(&self, lead: NewLead) -> Result<u64, StorageError> {
        let mut inner = self.inner();
        inner.next_lead_id += 1;
        let id = inner.next_lead_id;

        let now = Utc::now();
        inner.leads.push(LeadRecord {
            id,
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            chatbot_id: lead.chatbot_id,
            company_name: lead.company_name,
            session_id: lead.session_id,
            questions_asked: lead.questions_asked,
            conversation: lead.conversation,
            started_at: now,
            ended_at: now,
        });

        info!(lead_id = id, "lead saved");
        Ok(id)
    }

    fn get_leads(&self, chatbot_id: Option<&str>) -> Vec<LeadRecord> {
        let inner = self.inner();
        match chatbot_id {
            Some(wanted) => inner
                .leads
                .iter()
                .filter(|lead| lead.chatbot_id == wanted)
                .cloned()
                .collect(),
            None => inner.leads.clone(),
        }
    }

    fn save_chatbot(
        &self,
        chatbot_id: &str,
        company_name: &str,
        website_url: &str,
        embed_code: &str,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner();
        let now = Utc::now();

        if let Some(existing) = inner.chatbots.get_mut(chatbot_id) {
            existing.company_name = company_name.to_string();
            existing.website_url = website_url.to_string();
            existing.embed_code = embed_code.to_string();
            existing.updated_at = now;
        } else {
            inner.next_chatbot_id += 1;
            let id = inner.next_chatbot_id;
            inner.chatbots.insert(
                chatbot_id.to_string(),
                ChatbotConfig {
                    id,
                    chatbot_id: chatbot_id.to_string(),
                    company_name: company_name.to_string(),
                    website_url: website_url.to_string(),
                    embed_code: embed_code.to_string(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        info!(chatbot_id, company_name, "chatbot saved");
        Ok(())
    }

    fn get_chatbot(&self, chatbot_id: &str) -> Option<ChatbotConfig> {
        self.inner().chatbots.get(chatbot_id).cloned()
    }
}

impl MemoryStore {
    /// All stored chatbot configs, most recently updated first.
    pub fn list_chatbots(&self) -> Vec<ChatbotConfig> {
        let inner = self.inner();
        let mut configs: Vec<ChatbotConfig> = inner.chatbots.values().cloned().collect();
        configs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        configs
    }
}
