use uuid::Uuid;

use sitebot_schema::ConversationTurn;

use crate::lead::LeadCapture;

/// Per-visitor state, passed explicitly to every handler. One chatbot at a
/// time is "current"; switching it resets the conversation and the capture
/// machine.
pub struct SessionContext {
    pub session_id: String,
    pub current: Option<String>,
    pub history: Vec<ConversationTurn>,
    pub question_count: u32,
    pub capture: LeadCapture,
    pub lead_captured: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            current: None,
            history: Vec::new(),
            question_count: 0,
            capture: LeadCapture::default(),
            lead_captured: false,
        }
    }

    /// Make a chatbot (by registry slug) current and reset everything the
    /// previous conversation accumulated.
    pub fn switch_chatbot(&mut self, slug: impl Into<String>) {
        self.current = Some(slug.into());
        self.reset_conversation();
    }

    /// Drop the current chatbot, e.g. when it is deleted.
    pub fn clear_current(&mut self) {
        self.current = None;
        self.reset_conversation();
    }

    fn reset_conversation(&mut self) {
        self.history.clear();
        self.question_count = 0;
        self.lead_captured = false;
        self.capture.reset();
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::CaptureState;

    #[test]
    fn new_sessions_start_clean_with_unique_ids() {
        let a = SessionContext::new();
        let b = SessionContext::new();
        assert_ne!(a.session_id, b.session_id);
        assert!(a.current.is_none());
        assert!(a.history.is_empty());
        assert_eq!(a.question_count, 0);
        assert!(!a.lead_captured);
        assert_eq!(a.capture.state(), CaptureState::Inactive);
    }

    #[test]
    fn switching_chatbot_resets_conversation_state() {
        let mut session = SessionContext::new();
        session.switch_chatbot("acme");
        session.history.push(ConversationTurn::user("hi"));
        session.question_count = 4;
        session.lead_captured = true;
        session.capture.begin();

        session.switch_chatbot("other-co");

        assert_eq!(session.current.as_deref(), Some("other-co"));
        assert!(session.history.is_empty());
        assert_eq!(session.question_count, 0);
        assert!(!session.lead_captured);
        assert_eq!(session.capture.state(), CaptureState::Inactive);
    }
}
