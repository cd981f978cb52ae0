//! Environment-driven configuration
//!
//! Everything the pipeline needs to talk to the outside world comes from
//! environment variables (a `.env` file is honored via dotenvy). The
//! library itself never reads the environment implicitly; callers build
//! an [`AssistantConfig`] once and pass it down.

use url::Url;

use crate::error::AssistantError;

/// Which interpreter strategy the session should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpreterKind {
    /// Deterministic keyword/priority FAQ matcher (no network)
    RuleBased,
    /// Constrained-JSON generative resolver (Gemini API)
    #[default]
    Generative,
}

impl std::str::FromStr for InterpreterKind {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" | "rule_based" | "faq" => Ok(InterpreterKind::RuleBased),
            "generative" | "gemini" => Ok(InterpreterKind::Generative),
            other => Err(AssistantError::Config(format!(
                "unknown interpreter strategy '{other}' (expected 'rules' or 'generative')"
            ))),
        }
    }
}

/// Generative model configuration
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            // Low temperature for consistent structured output
            temperature: 0.1,
            max_output_tokens: 1024,
            timeout_seconds: 30,
        }
    }
}

/// Top-level assistant configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Backend base URL, including the `/api` prefix
    pub api_base_url: Url,
    /// Bearer token for the backend; submissions without one fail with
    /// the "must log in" message rather than an anonymous call
    pub api_token: Option<String>,
    pub interpreter: InterpreterKind,
    pub model: ModelConfig,
    /// Backend request timeout
    pub request_timeout_seconds: u64,
}

impl AssistantConfig {
    /// Build a configuration from environment variables.
    ///
    /// Reads `FOTIVA_API_URL` (required), `FOTIVA_API_TOKEN`,
    /// `FOTIVA_INTERPRETER`, `GEMINI_API_KEY`, and `GEMINI_MODEL`.
    pub fn from_env() -> Result<Self, AssistantError> {
        dotenvy::dotenv().ok();

        let base = std::env::var("FOTIVA_API_URL")
            .map_err(|_| AssistantError::Config("FOTIVA_API_URL not set".to_string()))?;
        let api_base_url = Url::parse(&base)
            .map_err(|e| AssistantError::Config(format!("invalid FOTIVA_API_URL: {e}")))?;

        let interpreter = match std::env::var("FOTIVA_INTERPRETER") {
            Ok(v) => v.parse()?,
            Err(_) => InterpreterKind::default(),
        };

        let mut model = ModelConfig {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            ..ModelConfig::default()
        };
        if let Ok(name) = std::env::var("GEMINI_MODEL") {
            model.model = name;
        }

        if interpreter == InterpreterKind::Generative && model.api_key.is_empty() {
            return Err(AssistantError::Config(
                "GEMINI_API_KEY required for the generative interpreter".to_string(),
            ));
        }

        Ok(Self {
            api_base_url,
            api_token: std::env::var("FOTIVA_API_TOKEN").ok(),
            interpreter,
            model,
            request_timeout_seconds: 30,
        })
    }

    /// Construct a config for a given base URL with defaults elsewhere
    pub fn with_base_url(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            api_token: None,
            interpreter: InterpreterKind::RuleBased,
            model: ModelConfig::default(),
            request_timeout_seconds: 30,
        }
    }
}
