//! The conversational assistant: transcript, draft, visibility, and the
//! single-flight admission rule for completion requests.

use crate::business;
use crate::completion::{Completion, CompletionRequest, ServiceUnavailable};
use crate::transcript::{Message, Role, Transcript};
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

/// Reply used when the service answers with no text.
pub const FILLER_REPLY: &str = "Sorry, I missed that. Can you repeat?";

static FALLBACK_REPLY: Lazy<String> = Lazy::new(|| {
    format!(
        "I am having trouble connecting right now. Please call us at {}.",
        business::PHONE
    )
});

/// Reply used whenever the service call fails.
pub fn fallback_reply() -> &'static str {
    &FALLBACK_REPLY
}

/// Where the session is in its request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingReply,
}

/// Why `submit` declined to dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyDraft,
    AwaitingReply,
    TranscriptFull,
}

/// Snapshot handed to the presentation layer
#[derive(Debug, Clone, Copy)]
pub struct ChatView<'a> {
    pub messages: &'a [Message],
    pub typing: bool,
    pub is_open: bool,
    pub draft: &'a str,
}

/// Session state for one chat widget
#[derive(Debug, Clone)]
pub struct Assistant {
    transcript: Transcript,
    pending_input: String,
    awaiting_response: bool,
    is_open: bool,
    system_instruction: String,
}

impl Assistant {
    pub fn new(capacity: usize) -> Self {
        Self::with_instruction(capacity, business::system_instruction())
    }

    pub fn with_instruction(capacity: usize, system_instruction: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(capacity),
            pending_input: String::new(),
            awaiting_response: false,
            is_open: false,
            system_instruction: system_instruction.into(),
        }
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    /// Replace the draft verbatim.
    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Admit the current draft if allowed: appends the user message, clears
    /// the draft, marks the session as awaiting, and returns the request to
    /// dispatch. Returns `None` without touching any state otherwise.
    pub fn submit(&mut self) -> Option<CompletionRequest> {
        match self.try_submit() {
            Ok(request) => Some(request),
            Err(reason) => {
                debug!(?reason, "submission rejected");
                None
            }
        }
    }

    pub fn try_submit(&mut self) -> Result<CompletionRequest, Rejection> {
        if self.awaiting_response {
            return Err(Rejection::AwaitingReply);
        }
        let text = self.pending_input.trim();
        if text.is_empty() {
            return Err(Rejection::EmptyDraft);
        }
        // Leave a slot for the reply.
        if self.transcript.remaining() < 2 {
            return Err(Rejection::TranscriptFull);
        }

        let text = text.to_string();
        let message = Message::new(Role::User, text.clone()).ok_or(Rejection::EmptyDraft)?;
        self.transcript.push(message);
        self.pending_input.clear();
        self.awaiting_response = true;

        info!(chars = text.len(), "submission admitted");
        Ok(CompletionRequest {
            system_instruction: self.system_instruction.clone(),
            content: text,
        })
    }

    /// Record the outcome of the in-flight request. Exactly one assistant
    /// message is appended per admitted submission; stray outcomes are
    /// ignored.
    pub fn resolve(&mut self, outcome: Result<Completion, ServiceUnavailable>) {
        if !self.awaiting_response {
            warn!("completion outcome arrived with no request in flight");
            return;
        }

        let reply = match outcome {
            Ok(Completion { text: Some(text) }) if !text.is_empty() => {
                info!("reply recorded");
                text
            }
            Ok(_) => {
                info!("empty completion, using filler reply");
                FILLER_REPLY.to_string()
            }
            Err(err) => {
                warn!(reason = err.reason(), "completion failed, using fallback reply");
                fallback_reply().to_string()
            }
        };

        let message = Message::new(Role::Assistant, reply)
            .or_else(|| Message::new(Role::Assistant, FILLER_REPLY));
        if let Some(message) = message {
            self.transcript.push(message);
        }
        self.awaiting_response = false;
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.pending_input
    }

    pub fn awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    #[allow(dead_code)]
    pub fn phase(&self) -> Phase {
        if self.awaiting_response {
            Phase::AwaitingReply
        } else {
            Phase::Idle
        }
    }

    pub fn view(&self) -> ChatView<'_> {
        ChatView {
            messages: self.transcript.as_slice(),
            typing: self.awaiting_response,
            is_open: self.is_open,
            draft: &self.pending_input,
        }
    }
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new(crate::transcript::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::GREETING;

    fn texts(assistant: &Assistant) -> Vec<(Role, String)> {
        assistant
            .transcript()
            .iter()
            .map(|m| (m.role(), m.text().to_string()))
            .collect()
    }

    #[test]
    fn fresh_session_greets_and_is_idle() {
        let assistant = Assistant::default();
        assert_eq!(texts(&assistant), vec![(Role::Assistant, GREETING.to_string())]);
        assert!(!assistant.awaiting_response());
        assert!(!assistant.is_open());
        assert_eq!(assistant.phase(), Phase::Idle);
    }

    #[test]
    fn submit_appends_trimmed_text_and_builds_request() {
        let mut assistant = Assistant::default();
        assistant.update_draft("  What are your hours?  ");

        let request = assistant.submit().unwrap();
        assert_eq!(request.content, "What are your hours?");
        assert_eq!(request.system_instruction, business::system_instruction());

        let last = assistant.transcript().last().unwrap();
        assert_eq!(last.role(), Role::User);
        assert_eq!(last.text(), "What are your hours?");
        assert_eq!(assistant.draft(), "");
        assert!(assistant.awaiting_response());
        assert_eq!(assistant.phase(), Phase::AwaitingReply);
    }

    #[test]
    fn blank_drafts_are_rejected() {
        let mut assistant = Assistant::default();
        for draft in ["", "   ", "\t\n "] {
            assistant.update_draft(draft);
            assert_eq!(assistant.try_submit(), Err(Rejection::EmptyDraft));
            assert_eq!(assistant.transcript().len(), 1);
            assert!(!assistant.awaiting_response());
            assert_eq!(assistant.draft(), draft);
        }
    }

    #[test]
    fn second_submit_while_awaiting_is_a_noop() {
        let mut assistant = Assistant::default();
        assistant.update_draft("first");
        assert!(assistant.submit().is_some());

        for follow_up in ["second", "third", "fourth"] {
            assistant.update_draft(follow_up);
            assert_eq!(assistant.try_submit(), Err(Rejection::AwaitingReply));
        }
        assert_eq!(assistant.transcript().len(), 2);
        assert_eq!(assistant.draft(), "fourth");
    }

    #[test]
    fn success_appends_reply_after_question() {
        let mut assistant = Assistant::default();
        assistant.update_draft("What are your hours?");
        assistant.submit().unwrap();
        assistant.resolve(Ok(Completion::text("Mon-Thu 9-5, Fri 9-3.")));

        let all = texts(&assistant);
        assert_eq!(
            &all[all.len() - 2..],
            &[
                (Role::User, "What are your hours?".to_string()),
                (Role::Assistant, "Mon-Thu 9-5, Fri 9-3.".to_string()),
            ]
        );
        assert!(!assistant.awaiting_response());
    }

    #[test]
    fn empty_or_absent_text_uses_filler() {
        for completion in [Completion::default(), Completion::text("")] {
            let mut assistant = Assistant::default();
            assistant.update_draft("hello");
            assistant.submit().unwrap();
            assistant.resolve(Ok(completion));
            assert_eq!(assistant.transcript().last().unwrap().text(), FILLER_REPLY);
            assert!(!assistant.awaiting_response());
        }
    }

    #[test]
    fn failure_appends_phone_fallback() {
        let mut assistant = Assistant::default();
        assistant.update_draft("What are your hours?");
        assistant.submit().unwrap();
        assistant.resolve(Err(ServiceUnavailable::new("connection refused")));

        let last = assistant.transcript().last().unwrap();
        assert_eq!(last.role(), Role::Assistant);
        assert_eq!(last.text(), fallback_reply());
        assert_eq!(
            last.text(),
            "I am having trouble connecting right now. Please call us at (310) 555-0187."
        );
        assert!(!assistant.awaiting_response());
    }

    #[test]
    fn retry_after_failure_is_admitted() {
        let mut assistant = Assistant::default();
        assistant.update_draft("hours?");
        assistant.submit().unwrap();
        assistant.resolve(Err(ServiceUnavailable::new("timeout")));

        assistant.update_draft("hours?");
        assert!(assistant.submit().is_some());
        assert_eq!(assistant.transcript().len(), 4);
    }

    #[test]
    fn stray_outcome_is_ignored() {
        let mut assistant = Assistant::default();
        assistant.resolve(Ok(Completion::text("unsolicited")));
        assert_eq!(assistant.transcript().len(), 1);
    }

    #[test]
    fn full_transcript_rejects_submission() {
        let mut assistant = Assistant::new(3);
        assistant.update_draft("one");
        assistant.submit().unwrap();
        assistant.resolve(Ok(Completion::text("reply")));

        assistant.update_draft("two");
        assert_eq!(assistant.try_submit(), Err(Rejection::TranscriptFull));
        assert_eq!(assistant.transcript().len(), 3);
        assert_eq!(assistant.draft(), "two");
    }

    #[test]
    fn visibility_is_idempotent_and_leaves_transcript_alone() {
        let mut assistant = Assistant::default();
        assistant.update_draft("hi");
        assistant.submit().unwrap();

        assistant.close();
        assistant.close();
        assert!(!assistant.is_open());
        assistant.open();
        assistant.open();
        assert!(assistant.is_open());
        assistant.toggle();
        assert!(!assistant.is_open());

        assert_eq!(assistant.transcript().len(), 2);
        assert!(assistant.awaiting_response());
    }

    #[test]
    fn draft_is_stored_verbatim_while_awaiting() {
        let mut assistant = Assistant::default();
        assistant.update_draft("first");
        assistant.submit().unwrap();
        assistant.update_draft("  next one ");
        assert_eq!(assistant.draft(), "  next one ");
    }

    #[test]
    fn view_reflects_typing_state() {
        let mut assistant = Assistant::default();
        assert!(!assistant.view().typing);
        assistant.update_draft("hi");
        assistant.submit().unwrap();
        let view = assistant.view();
        assert!(view.typing);
        assert_eq!(view.messages.len(), 2);
    }
}
