//! Generative interpreter
//!
//! Sends the utterance plus a directory digest through a constrained
//! generation call and parses the single JSON object returned into an
//! [`Intent`]. The transport lives behind the [`GenerativeModel`] trait
//! so the Gemini client can be swapped for a scripted model in tests.
//!
//! If the response cannot be parsed as a well-formed intent the
//! interpreter fails with [`AssistantError::Parse`]; the caller surfaces
//! a clarification message rather than guessing.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::Interpreter;
use crate::config::ModelConfig;
use crate::directory::DirectorySnapshot;
use crate::error::{AssistantError, BackendError, Result};
use crate::model::Intent;

/// Transport seam for the generative call
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send a system + user prompt pair, returning the raw model text
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

/// Google Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiModel {
    config: ModelConfig,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiModel {
    pub fn new(config: ModelConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AssistantError::Config(
                "generative model API key is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AssistantError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let full_prompt = format!("{system_prompt}\n\n{user_prompt}");

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: full_prompt }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            }),
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.config.model, self.config.api_key
        );

        debug!(model = %self.config.model, "sending generative request");

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(BackendError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "generative API error");
            return Err(AssistantError::Backend(BackendError::Api {
                status: status.as_u16(),
                detail: body,
            }));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(BackendError::Http)?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| {
                AssistantError::Parse("empty candidate list in model response".to_string())
            })?;

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Interpreter backed by a [`GenerativeModel`]
pub struct GenerativeInterpreter {
    model: Box<dyn GenerativeModel>,
}

impl GenerativeInterpreter {
    pub fn new(model: Box<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// System context block: today's date, current year, directory
    /// digest, and strict output-format instructions.
    fn build_system_prompt(directory: &DirectorySnapshot, today: NaiveDate) -> String {
        format!(
            r#"Você é o assistente do FOTIVA, um sistema de gestão para fotógrafos de eventos.
Hoje é {today} e o ano atual é {year}. Resolva expressões de data relativas
("amanhã", "próxima semana") em relação a essa data.

{digest}
Interprete a mensagem do usuário e responda com UM ÚNICO objeto JSON, sem
nenhum outro texto, no formato:

{{
  "action": "create_client" | "create_event" | "create_both" | "list_clients" | "list_events" | "answer" | "ask",
  "message": "texto a mostrar ao usuário",
  "client": {{"name": "...", "phone": "...", "email": "...", "notes": "..."}},
  "event": {{"client_id": "...", "client_name": "...", "event_type": "...", "event_date": "YYYY-MM-DDTHH:MM:SS", "location": "...", "total_value": 0, "amount_paid": 0, "remaining_installments": 1, "notes": "...", "status": "confirmado"}}
}}

Regras:
- Se o cliente mencionado já existe na lista acima, use "client_id" com o id listado.
- Se o cliente não existe e o usuário pediu um evento, use "create_both" com os dados do cliente e do evento.
- "client" só é necessário para create_client/create_both; "event" só para create_event/create_both.
- Datas sempre em ISO 8601. Valores monetários como números.
- Se faltar informação essencial (nome ou data), use "ask" com a pergunta em "message".
- Nunca invente ids de clientes."#,
            today = today.format("%Y-%m-%d"),
            year = today.year(),
            digest = directory.digest(),
        )
    }

    fn parse_intent(raw: &str) -> Result<Intent> {
        let cleaned = strip_code_fences(raw);
        serde_json::from_str(cleaned).map_err(|e| {
            AssistantError::Parse(format!("{e} (response was {} bytes)", raw.len()))
        })
    }
}

/// Strip optional markdown code-fence markers around a JSON payload.
///
/// Accepts ```` ```json ... ``` ````, bare ```` ``` ... ``` ````, and
/// unfenced text identically.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line
    let rest = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl Interpreter for GenerativeInterpreter {
    async fn interpret(
        &self,
        utterance: &str,
        directory: &DirectorySnapshot,
        today: NaiveDate,
    ) -> Result<Intent> {
        let system_prompt = Self::build_system_prompt(directory, today);
        let raw = self.model.generate(&system_prompt, utterance).await?;

        let intent = Self::parse_intent(&raw)?;
        info!(
            model = %self.model.model_name(),
            action = ?intent.action,
            "utterance interpreted"
        );
        Ok(intent)
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IntentAction;

    /// Scripted model returning a fixed response
    struct ScriptedModel {
        response: String,
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.response.clone())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn interpreter(response: &str) -> GenerativeInterpreter {
        GenerativeInterpreter::new(Box::new(ScriptedModel {
            response: response.to_string(),
        }))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn strip_fences_variants() {
        let json = r#"{"action":"answer","message":"oi"}"#;
        assert_eq!(strip_code_fences(json), json);
        assert_eq!(strip_code_fences(&format!("```json\n{json}\n```")), json);
        assert_eq!(strip_code_fences(&format!("```\n{json}\n```")), json);
        assert_eq!(strip_code_fences(&format!("  {json}  ")), json);
    }

    #[test]
    fn system_prompt_injects_date_year_and_digest() {
        let dir = DirectorySnapshot::default();
        let prompt = GenerativeInterpreter::build_system_prompt(&dir, today());
        assert!(prompt.contains("2025-03-01"));
        assert!(prompt.contains("2025"));
        assert!(prompt.contains("Clientes cadastrados: nenhum"));
        assert!(prompt.contains("UM ÚNICO objeto JSON"));
    }

    #[tokio::test]
    async fn parses_fenced_intent() {
        let interp = interpreter(
            "```json\n{\"action\":\"create_client\",\"client\":{\"name\":\"Maria\"}}\n```",
        );
        let intent = interp
            .interpret("novo cliente Maria", &DirectorySnapshot::default(), today())
            .await
            .unwrap();
        assert_eq!(intent.action, IntentAction::CreateClient);
        assert_eq!(
            intent.client.unwrap().name.as_deref(),
            Some("Maria")
        );
    }

    #[tokio::test]
    async fn malformed_output_is_parse_failure() {
        let interp = interpreter("desculpe, não consegui entender");
        let err = interp
            .interpret("qualquer coisa", &DirectorySnapshot::default(), today())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Parse(_)));
    }

    #[tokio::test]
    async fn event_draft_amounts_coerce() {
        let interp = interpreter(
            r#"{"action":"create_event","event":{"client_name":"Maria","event_type":"ensaio","event_date":"2025-03-10T15:00:00","total_value":"800"}}"#,
        );
        let intent = interp
            .interpret("ensaio pra Maria", &DirectorySnapshot::default(), today())
            .await
            .unwrap();
        let event = intent.event.unwrap();
        assert_eq!(event.total_value, "800".parse().unwrap());
        assert_eq!(event.amount_paid, rust_decimal::Decimal::ZERO);
    }

    // Integration test - requires API key
    #[tokio::test]
    #[ignore = "Requires GEMINI_API_KEY environment variable"]
    async fn gemini_live_interpretation() {
        let config = ModelConfig {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            ..ModelConfig::default()
        };
        let model = GeminiModel::new(config).unwrap();
        let interp = GenerativeInterpreter::new(Box::new(model));
        let intent = interp
            .interpret(
                "Criar evento para Maria, casamento dia 15/03 às 15h, valor 2500",
                &DirectorySnapshot::default(),
                chrono::Local::now().date_naive(),
            )
            .await
            .unwrap();
        println!("intent: {intent:?}");
    }
}
