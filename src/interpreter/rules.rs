//! Rule-based FAQ interpreter
//!
//! Deterministic strategy: normalizes the utterance, scans a fixed
//! ordered table of keyword sets, and answers with the configured
//! response of the lowest-numbered priority among all rules with at
//! least one substring hit. Ties go to the first-declared rule; no hit
//! falls back to a fixed default. This is a pure FAQ lookup — it only
//! ever produces `answer` intents and never touches the backend.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::Interpreter;
use crate::directory::DirectorySnapshot;
use crate::error::{AssistantError, Result};
use crate::model::Intent;
use crate::normalize::fold;

/// Production FAQ table, embedded at compile time
const BUILTIN_RULES: &str = include_str!("../../config/faq_rules.yaml");

/// One keyword rule in the table
#[derive(Debug, Clone, Deserialize)]
pub struct FaqRule {
    pub keywords: Vec<String>,
    pub response: String,
    pub priority: u32,
}

/// Ordered FAQ rule table loaded from YAML
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTable {
    pub welcome_message: String,
    pub default_response: String,
    pub rules: Vec<FaqRule>,
}

impl RuleTable {
    /// Parse a rule table from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| AssistantError::Config(format!("invalid FAQ rule table: {e}")))
    }

    /// The embedded production table
    pub fn builtin() -> Self {
        // The embedded table is validated by tests; a parse failure here
        // is a build defect, not a runtime condition.
        Self::from_yaml(BUILTIN_RULES).expect("embedded FAQ rule table must parse")
    }

    /// Find the best response for an utterance, if any rule hits.
    ///
    /// Scans rules in declaration order and keeps the first rule seen at
    /// the lowest priority number with at least one normalized-substring
    /// keyword hit. Which keyword within the set matched is irrelevant.
    pub fn best_response(&self, utterance: &str) -> Option<&str> {
        let folded = fold(utterance);

        let mut best: Option<(&FaqRule, u32)> = None;
        for rule in &self.rules {
            let hit = rule.keywords.iter().any(|k| folded.contains(&fold(k)));
            if !hit {
                continue;
            }
            match best {
                // Strictly-lower priority wins; equal keeps the earlier rule
                Some((_, priority)) if rule.priority >= priority => {}
                _ => best = Some((rule, rule.priority)),
            }
        }

        best.map(|(rule, _)| rule.response.as_str())
    }
}

/// FAQ-style interpreter over a [`RuleTable`]
pub struct RuleBasedInterpreter {
    table: RuleTable,
}

impl RuleBasedInterpreter {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    /// Interpreter over the embedded production table
    pub fn builtin() -> Self {
        Self::new(RuleTable::builtin())
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }
}

#[async_trait]
impl Interpreter for RuleBasedInterpreter {
    async fn interpret(
        &self,
        utterance: &str,
        _directory: &DirectorySnapshot,
        _today: NaiveDate,
    ) -> Result<Intent> {
        let response = match self.table.best_response(utterance) {
            Some(response) => {
                debug!("FAQ rule hit");
                response
            }
            None => {
                debug!("no FAQ rule hit, using default response");
                &self.table.default_response
            }
        };
        Ok(Intent::answer(response))
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}
