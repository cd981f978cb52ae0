//! Core data model for the assistant pipeline
//!
//! Wire-compatible representations of the backend's Client and Event
//! records, plus the transient `Intent` value produced per utterance.
//! Identity for both record types is the backend-assigned opaque `id`;
//! names are not unique.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Type alias for backend-assigned record identifiers
pub type RecordId = String;

/// A client record as returned by `GET /clients`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Event lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pendente,
    Confirmado,
    #[serde(rename = "concluído", alias = "concluido")]
    Concluido,
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Confirmado
    }
}

/// An event record as returned by `GET /events`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub client_id: RecordId,
    pub event_type: String,
    pub event_date: NaiveDateTime,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_value: Decimal,
    #[serde(default)]
    pub amount_paid: Decimal,
    #[serde(default = "default_installments")]
    pub remaining_installments: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
}

fn default_installments() -> u32 {
    1
}

/// Payload for `POST /clients`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload for `POST /events`
///
/// `event_date` is serialized as ISO 8601 without offset, matching what
/// the backend stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub client_id: RecordId,
    pub event_type: String,
    pub event_date: NaiveDateTime,
    #[serde(default)]
    pub location: Option<String>,
    pub total_value: Decimal,
    pub amount_paid: Decimal,
    pub remaining_installments: u32,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: EventStatus,
}

/// What the user wants done, as decided by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    CreateClient,
    CreateEvent,
    CreateBoth,
    ListClients,
    ListEvents,
    Answer,
    Ask,
}

/// Structured interpretation of a single utterance
///
/// Transient: produced by an interpreter, consumed by the executor,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub action: IntentAction,
    /// Text to show the user (required for `answer`/`ask`, optional
    /// confirmation override for the create actions)
    #[serde(default)]
    pub message: Option<String>,
    /// Client-shaped partial for `create_client`/`create_both`
    #[serde(default)]
    pub client: Option<ClientDraft>,
    /// Event-shaped partial for `create_event`/`create_both`
    #[serde(default)]
    pub event: Option<EventDraft>,
}

impl Intent {
    /// Convenience constructor for terminal text-only intents
    pub fn answer(message: impl Into<String>) -> Self {
        Self {
            action: IntentAction::Answer,
            message: Some(message.into()),
            client: None,
            event: None,
        }
    }
}

/// Partial client extracted from an utterance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial event extracted from an utterance
///
/// The client is referenced by `client_id` when the model echoed a known
/// id from the directory digest, or by `client_name` otherwise. Amounts
/// tolerate whatever shape the model emits: number, numeric string, or
/// garbage all coerce through [`lenient_decimal`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub client_id: Option<RecordId>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    /// ISO 8601 date-time as emitted by the model; parsed by the executor
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_value: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount_paid: Decimal,
    #[serde(default)]
    pub remaining_installments: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<EventStatus>,
}

/// Deserialize a monetary field leniently.
///
/// Accepts a JSON number, a numeric string, null, or a missing field.
/// Non-numeric input and negatives collapse to zero rather than failing
/// the whole intent parse.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_decimal(&value))
}

/// Coerce an arbitrary JSON value to a non-negative decimal
pub fn coerce_decimal(value: &serde_json::Value) -> Decimal {
    let parsed = match value {
        serde_json::Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };
    match parsed {
        Some(d) if d >= Decimal::ZERO => d,
        _ => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn intent_action_wire_names() {
        let json = serde_json::to_string(&IntentAction::CreateBoth).unwrap();
        assert_eq!(json, "\"create_both\"");
        let back: IntentAction = serde_json::from_str("\"list_clients\"").unwrap();
        assert_eq!(back, IntentAction::ListClients);
    }

    #[test]
    fn event_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventStatus::Concluido).unwrap(),
            "\"concluído\""
        );
        let s: EventStatus = serde_json::from_str("\"concluido\"").unwrap();
        assert_eq!(s, EventStatus::Concluido);
        let s: EventStatus = serde_json::from_str("\"pendente\"").unwrap();
        assert_eq!(s, EventStatus::Pendente);
    }

    #[test]
    fn lenient_decimal_shapes() {
        let draft: EventDraft = serde_json::from_str(
            r#"{"client_name":"Maria","total_value":"2500","amount_paid":800.5}"#,
        )
        .unwrap();
        assert_eq!(draft.total_value, dec("2500"));
        assert_eq!(draft.amount_paid, dec("800.5"));
    }

    #[test]
    fn lenient_decimal_garbage_and_missing() {
        let draft: EventDraft =
            serde_json::from_str(r#"{"total_value":"abc","amount_paid":null}"#).unwrap();
        assert_eq!(draft.total_value, Decimal::ZERO);
        assert_eq!(draft.amount_paid, Decimal::ZERO);

        let draft: EventDraft = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(draft.total_value, Decimal::ZERO);
    }

    #[test]
    fn lenient_decimal_clamps_negative() {
        let draft: EventDraft = serde_json::from_str(r#"{"total_value":-300}"#).unwrap();
        assert_eq!(draft.total_value, Decimal::ZERO);
    }

    #[test]
    fn intent_parses_minimal_answer() {
        let intent: Intent =
            serde_json::from_str(r#"{"action":"answer","message":"Olá!"}"#).unwrap();
        assert_eq!(intent.action, IntentAction::Answer);
        assert_eq!(intent.message.as_deref(), Some("Olá!"));
        assert!(intent.client.is_none());
        assert!(intent.event.is_none());
    }
}
