//! Conversation session
//!
//! Owns the transcript and the single-turn orchestration: fetch a fresh
//! directory snapshot, interpret the utterance, execute the intent, and
//! append both sides of the exchange. One turn at a time — a submission
//! while another is in flight is dropped, not queued.

use chrono::{Local, NaiveDate};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::backend::Backend;
use crate::directory::DirectorySnapshot;
use crate::error::AssistantError;
use crate::executor::{self, CLARIFICATION_MESSAGE};
use crate::interpreter::Interpreter;

/// Reply shown when anything upstream of execution fails
const TURN_FAILURE_MESSAGE: &str = "❌ Algo deu errado. Tente novamente em instantes.";

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One line of the conversation transcript
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

/// A single user's chat session with the assistant
pub struct ConversationSession {
    interpreter: Box<dyn Interpreter>,
    backend: Box<dyn Backend>,
    transcript: Vec<ChatMessage>,
    in_progress: bool,
    /// Test override for the date injected into interpretation
    today_override: Option<NaiveDate>,
}

impl ConversationSession {
    pub fn new(interpreter: Box<dyn Interpreter>, backend: Box<dyn Backend>) -> Self {
        Self {
            interpreter,
            backend,
            transcript: Vec::new(),
            in_progress: false,
            today_override: None,
        }
    }

    /// Open the transcript with an assistant greeting
    pub fn greet(&mut self, text: impl Into<String>) {
        self.transcript.push(ChatMessage {
            speaker: Speaker::Assistant,
            text: text.into(),
        });
    }

    /// Pin the date used for relative-date interpretation (tests)
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today_override = Some(today);
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Whether a turn is currently in flight
    pub fn is_busy(&self) -> bool {
        self.in_progress
    }

    /// Run one conversation turn and return the assistant's reply.
    ///
    /// Returns `None` without touching the transcript when the utterance
    /// is blank or another turn is still in flight.
    pub async fn submit(&mut self, utterance: &str) -> Option<String> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return None;
        }
        if self.in_progress {
            warn!("submission dropped, turn already in flight");
            return None;
        }
        self.in_progress = true;

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("chat_turn", %request_id);
        let reply = self.run_turn(utterance).instrument(span).await;

        self.transcript.push(ChatMessage {
            speaker: Speaker::User,
            text: utterance.to_string(),
        });
        self.transcript.push(ChatMessage {
            speaker: Speaker::Assistant,
            text: reply.clone(),
        });
        self.in_progress = false;
        Some(reply)
    }

    async fn run_turn(&self, utterance: &str) -> String {
        let directory = DirectorySnapshot::fetch(self.backend.as_ref()).await;
        let today = self
            .today_override
            .unwrap_or_else(|| Local::now().date_naive());

        let intent = match self
            .interpreter
            .interpret(utterance, &directory, today)
            .await
        {
            Ok(intent) => intent,
            Err(AssistantError::Parse(reason)) => {
                warn!(%reason, "interpretation did not yield an intent");
                return CLARIFICATION_MESSAGE.to_string();
            }
            Err(e) => {
                warn!(error = %e, "turn failed before execution");
                return TURN_FAILURE_MESSAGE.to_string();
            }
        };

        info!(action = ?intent.action, interpreter = self.interpreter.name(), "intent resolved");
        executor::execute(intent, &directory, self.backend.as_ref()).await
    }
}
