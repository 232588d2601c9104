use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use sitebot_schema::ConversationTurn;

use crate::storage::{LeadStore, NewLead, StorageError};

pub const ANONYMOUS_NAME: &str = "Anonymous";
pub const EMAIL_PLACEHOLDER: &str = "not_provided@example.com";
pub const PHONE_PLACEHOLDER: &str = "Not provided";

/// The three-step form walks strictly forward; the only way back to
/// `Inactive` is a reset when the active chatbot changes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    #[default]
    Inactive,
    AskName,
    AskEmail,
    AskPhone,
    Captured,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "value")]
pub enum FormAction {
    Submit(String),
    Skip,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("please enter your name")]
    EmptyName,
    #[error("please enter a valid email")]
    InvalidEmail,
    #[error("no form step is active")]
    NotCapturing,
    #[error("saving the lead failed, please try again")]
    Storage(#[from] StorageError),
}

/// What the caller renders after a successful form action.
#[derive(Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Advanced to the given state; render its prompt.
    Next(CaptureState),
    /// The lead was persisted; the form is done.
    Captured { lead_id: u64 },
}

/// Identity and conversation context attached to the lead at the terminal
/// step.
pub struct CapturePayload<'a> {
    pub chatbot_id: &'a str,
    pub company_name: &'a str,
    pub session_id: &'a str,
    pub questions_asked: u32,
    pub conversation: &'a [ConversationTurn],
}

#[derive(Debug, Clone, Default)]
struct LeadDraft {
    name: Option<String>,
    email: Option<String>,
}

/// The lead-capture state machine. All transitions go through [`apply`];
/// out-of-phase actions are rejected rather than ignored.
///
/// [`apply`]: LeadCapture::apply
#[derive(Default)]
pub struct LeadCapture {
    state: CaptureState,
    draft: LeadDraft,
}

impl LeadCapture {
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// True while a form step is waiting on the visitor, which is exactly
    /// when free chat input must be refused.
    pub fn is_capturing(&self) -> bool {
        matches!(
            self.state,
            CaptureState::AskName | CaptureState::AskEmail | CaptureState::AskPhone
        )
    }

    /// The question to render for the current step.
    pub fn prompt(&self) -> Option<&'static str> {
        match self.state {
            CaptureState::AskName => Some("May I know your name?"),
            CaptureState::AskEmail => Some("What's your email address?"),
            CaptureState::AskPhone => Some("And your phone number?"),
            CaptureState::Inactive | CaptureState::Captured => None,
        }
    }

    /// Start the form. Only valid from `Inactive`; returns whether the
    /// machine actually started.
    pub fn begin(&mut self) -> bool {
        if self.state == CaptureState::Inactive {
            self.draft = LeadDraft::default();
            self.state = CaptureState::AskName;
            true
        } else {
            false
        }
    }

    /// Back to `Inactive`, dropping any partially collected fields. Called
    /// when the active chatbot changes.
    pub fn reset(&mut self) {
        self.state = CaptureState::Inactive;
        self.draft = LeadDraft::default();
    }

    /// Total transition function for the three form steps. Validation
    /// failures and storage failures leave the state unchanged so the same
    /// action can be retried.
    pub fn apply(
        &mut self,
        action: FormAction,
        payload: CapturePayload<'_>,
        store: &dyn LeadStore,
    ) -> Result<StepOutcome, FormError> {
        match self.state {
            CaptureState::Inactive | CaptureState::Captured => Err(FormError::NotCapturing),
            CaptureState::AskName => {
                let name = match action {
                    FormAction::Submit(value) => {
                        let trimmed = value.trim();
                        if trimmed.is_empty() {
                            return Err(FormError::EmptyName);
                        }
                        trimmed.to_string()
                    }
                    FormAction::Skip => ANONYMOUS_NAME.to_string(),
                };
                self.draft.name = Some(name);
                self.state = CaptureState::AskEmail;
                Ok(StepOutcome::Next(self.state))
            }
            CaptureState::AskEmail => {
                let email = match action {
                    FormAction::Submit(value) => {
                        if !validate_email(&value) {
                            return Err(FormError::InvalidEmail);
                        }
                        value.trim().to_string()
                    }
                    FormAction::Skip => EMAIL_PLACEHOLDER.to_string(),
                };
                self.draft.email = Some(email);
                self.state = CaptureState::AskPhone;
                Ok(StepOutcome::Next(self.state))
            }
            CaptureState::AskPhone => {
                let phone = match action {
                    FormAction::Submit(value) => {
                        let trimmed = value.trim();
                        if trimmed.is_empty() {
                            PHONE_PLACEHOLDER.to_string()
                        } else {
                            trimmed.to_string()
                        }
                    }
                    FormAction::Skip => PHONE_PLACEHOLDER.to_string(),
                };

                let lead = NewLead {
                    chatbot_id: payload.chatbot_id.to_string(),
                    company_name: payload.company_name.to_string(),
                    name: self
                        .draft
                        .name
                        .clone()
                        .unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
                    email: self
                        .draft
                        .email
                        .clone()
                        .unwrap_or_else(|| EMAIL_PLACEHOLDER.to_string()),
                    phone,
                    session_id: payload.session_id.to_string(),
                    questions_asked: payload.questions_asked,
                    conversation: payload.conversation.to_vec(),
                };

                match store.save_lead(lead) {
                    Ok(lead_id) => {
                        self.state = CaptureState::Captured;
                        Ok(StepOutcome::Captured { lead_id })
                    }
                    Err(err) => {
                        // Stay on the phone step; the visitor may retry.
                        warn!(%err, "lead save failed");
                        Err(err.into())
                    }
                }
            }
        }
    }
}

/// The original product's loose email check: an `@` somewhere, and a `.`
/// after the last `@`.
pub fn validate_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() {
        return false;
    }
    match email.rsplit_once('@') {
        Some((_, domain)) => domain.contains('.'),
        None => false,
    }
}
