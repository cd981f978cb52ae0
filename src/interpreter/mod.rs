//! Utterance interpretation
//!
//! Converts a free-text utterance plus a directory snapshot into a
//! structured [`Intent`]. Two interchangeable strategies satisfy the
//! same contract:
//!
//! - [`rules::RuleBasedInterpreter`] — deterministic keyword/priority
//!   FAQ lookup, no network, only ever produces `answer` intents.
//! - [`generative::GenerativeInterpreter`] — constrained-JSON request
//!   to a generative model, able to produce the full action set.
//!
//! Interpretation has no side effects; all mutation happens later in
//! the executor.

pub mod generative;
pub mod rules;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::{AssistantConfig, InterpreterKind};
use crate::directory::DirectorySnapshot;
use crate::error::Result;
use crate::model::Intent;

/// Strategy interface for utterance interpretation
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Interpret a non-empty, trimmed utterance.
    ///
    /// `today` anchors relative date expressions ("amanhã", "próxima
    /// semana") so interpretation is deterministic with respect to it.
    async fn interpret(
        &self,
        utterance: &str,
        directory: &DirectorySnapshot,
        today: NaiveDate,
    ) -> Result<Intent>;

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}

/// Build the interpreter selected by configuration
pub fn build_interpreter(config: &AssistantConfig) -> Result<Box<dyn Interpreter>> {
    match config.interpreter {
        InterpreterKind::RuleBased => Ok(Box::new(rules::RuleBasedInterpreter::builtin())),
        InterpreterKind::Generative => {
            let model = generative::GeminiModel::new(config.model.clone())?;
            Ok(Box::new(generative::GenerativeInterpreter::new(Box::new(
                model,
            ))))
        }
    }
}
