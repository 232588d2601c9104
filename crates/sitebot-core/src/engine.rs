//! Per-turn policy: route visitor input to the chatbot or the lead form.

use tracing::debug;

use sitebot_provider::Completion;
use sitebot_schema::ConversationTurn;

use crate::chatbot::Chatbot;
use crate::lead::{CapturePayload, FormAction, FormError, StepOutcome};
use crate::session::SessionContext;
use crate::storage::LeadStore;

/// After this many answered questions the lead form takes over the input.
pub const CAPTURE_TRIGGER_QUESTIONS: u32 = 3;

pub const FORM_PENDING_MESSAGE: &str =
    "Please complete the form above before continuing the chat.";

pub struct EngineReply {
    pub answer: String,
    /// True when this turn tripped the capture threshold; the caller should
    /// render the first form prompt next.
    pub capture_started: bool,
}

/// Handle one chat message. While the form is active, free chat is refused
/// and the triggering question itself still gets a normal answer before the
/// form appears.
pub async fn handle_message(
    session: &mut SessionContext,
    chatbot: &Chatbot,
    text: &str,
    completion: &dyn Completion,
) -> EngineReply {
    if session.capture.is_capturing() {
        debug!("chat input refused while the lead form is active");
        return EngineReply {
            answer: FORM_PENDING_MESSAGE.to_string(),
            capture_started: false,
        };
    }

    session.history.push(ConversationTurn::user(text));
    let answer = chatbot.ask(text, completion).await;
    session.history.push(ConversationTurn::assistant(answer.clone()));
    session.question_count += 1;

    let capture_started = maybe_begin_capture(session);
    EngineReply {
        answer,
        capture_started,
    }
}

/// Observe the trigger condition: enough questions, no lead captured yet,
/// no form already in flight.
pub fn maybe_begin_capture(session: &mut SessionContext) -> bool {
    if session.question_count >= CAPTURE_TRIGGER_QUESTIONS
        && !session.lead_captured
        && !session.capture.is_capturing()
    {
        session.capture.begin()
    } else {
        false
    }
}

/// Apply a form action for the session against the given chatbot, marking
/// the session once the lead is stored.
pub fn handle_form_action(
    session: &mut SessionContext,
    chatbot: &Chatbot,
    action: FormAction,
    store: &dyn LeadStore,
) -> Result<StepOutcome, FormError> {
    let payload = CapturePayload {
        chatbot_id: &chatbot.chatbot_id,
        company_name: &chatbot.company_name,
        session_id: &session.session_id,
        questions_asked: session.question_count,
        conversation: &session.history,
    };
    let outcome = session.capture.apply(action, payload, store)?;
    if matches!(outcome, StepOutcome::Captured { .. }) {
        session.lead_captured = true;
    }
    Ok(outcome)
}
