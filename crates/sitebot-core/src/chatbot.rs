use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use sitebot_provider::Completion;
use sitebot_scrape::{Progress, ScrapeError, SiteScraper};
use sitebot_schema::{ContactInfo, ScrapedPage};

pub const NOT_READY_MESSAGE: &str = "The chatbot is not ready yet. Please try again.";

/// How much scraped knowledge goes into the model prompt.
const CONTEXT_PAGES: usize = 3;
const CONTEXT_CHARS_PER_PAGE: usize = 800;

const CHATBOT_ID_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Greeting,
    ContactRequest,
}

struct ReplyRule {
    intent: Intent,
    keywords: &'static [&'static str],
}

/// Evaluated top to bottom; the first rule whose keyword appears in the
/// lowercased question wins.
const REPLY_RULES: &[ReplyRule] = &[
    ReplyRule {
        intent: Intent::Greeting,
        keywords: &["hi", "hello", "hey"],
    },
    ReplyRule {
        intent: Intent::ContactRequest,
        keywords: &["email", "contact", "phone"],
    },
];

fn classify(question: &str) -> Option<Intent> {
    let lowered = question.to_lowercase();
    REPLY_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|rule| rule.intent)
}

/// Unique token identifying a chatbot registration.
pub fn generate_chatbot_id(company_name: &str, website_url: &str) -> String {
    let digest = Sha256::digest(
        format!("{company_name}{website_url}{}", Uuid::new_v4()).as_bytes(),
    );
    let mut id = hex::encode(digest);
    id.truncate(CHATBOT_ID_LEN);
    id
}

/// The scraped knowledge and identity bound to one company website,
/// reusable across chat sessions.
pub struct Chatbot {
    pub company_name: String,
    pub website_url: String,
    pub chatbot_id: String,
    pages: Vec<ScrapedPage>,
    contact_info: ContactInfo,
    ready: bool,
}

impl Chatbot {
    pub fn new(
        company_name: impl Into<String>,
        website_url: impl Into<String>,
        chatbot_id: impl Into<String>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            website_url: website_url.into(),
            chatbot_id: chatbot_id.into(),
            pages: Vec::new(),
            contact_info: ContactInfo::default(),
            ready: false,
        }
    }

    /// Rebuild a ready chatbot from already-scraped knowledge.
    pub fn with_knowledge(
        company_name: impl Into<String>,
        website_url: impl Into<String>,
        chatbot_id: impl Into<String>,
        pages: Vec<ScrapedPage>,
        contact_info: ContactInfo,
    ) -> Self {
        Self {
            pages,
            contact_info,
            ready: true,
            ..Self::new(company_name, website_url, chatbot_id)
        }
    }

    /// Scrape the website and store its knowledge. Only infrastructure
    /// failures surface as errors; an unreachable site still yields a ready
    /// chatbot with no pages.
    pub async fn initialize(&mut self, progress: Option<&Progress<'_>>) -> Result<(), ScrapeError> {
        let scraper = match SiteScraper::new() {
            Ok(scraper) => scraper,
            Err(err) => {
                warn!(company = %self.company_name, %err, "chatbot initialization failed");
                return Err(err);
            }
        };

        let (pages, contact_info) = scraper.scrape_site(&self.website_url, progress).await;
        self.pages = pages;
        self.contact_info = contact_info;
        self.ready = true;

        info!(
            company = %self.company_name,
            pages = self.pages.len(),
            "chatbot initialized"
        );
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pages(&self) -> &[ScrapedPage] {
        &self.pages
    }

    pub fn contact_info(&self) -> &ContactInfo {
        &self.contact_info
    }

    /// Answer a visitor question: canned intents first, then the language
    /// model with a context window built from the scraped pages. No
    /// conversation memory goes into the prompt.
    pub async fn ask(&self, question: &str, completion: &dyn Completion) -> String {
        if !self.ready {
            return NOT_READY_MESSAGE.to_string();
        }

        match classify(question) {
            Some(Intent::Greeting) => self.greeting_reply(),
            Some(Intent::ContactRequest) => self.contact_reply(),
            None => completion.complete(&self.context_prompt(question)).await,
        }
    }

    fn greeting_reply(&self) -> String {
        format!(
            "Hello! I'm the AI assistant for {}. How can I help you today?",
            self.company_name
        )
    }

    fn contact_reply(&self) -> String {
        let mut msg = format!("Contact {}\n\n", self.company_name);
        if !self.contact_info.emails.is_empty() {
            msg.push_str(&format!("Email: {}\n", self.contact_info.emails.join(", ")));
        }
        if !self.contact_info.phones.is_empty() {
            msg.push_str(&format!("Phone: {}\n", self.contact_info.phones.join(", ")));
        }
        msg.push_str(&self.website_url);
        msg
    }

    fn context_prompt(&self, question: &str) -> String {
        let context = self
            .pages
            .iter()
            .take(CONTEXT_PAGES)
            .map(|page| truncate_chars(&page.content, CONTEXT_CHARS_PER_PAGE))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a helpful assistant for {company}.\n\n\
             Context from their website:\n{context}\n\n\
             User question: {question}\n\n\
             Provide a helpful, natural 2-3 sentence answer.\n\n\
             Answer:",
            company = self.company_name,
        )
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        text.chars().take(max).collect()
    } else {
        text.to_string()
    }
}
