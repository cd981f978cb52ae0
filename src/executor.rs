//! Action executor
//!
//! State machine over `intent.action`: terminal text answers, snapshot
//! listings, and the create paths, including the two-step
//! `create_both` saga. Every backend failure is caught here and
//! converted into user-facing text with a `❌` marker (or `⚠️` for the
//! saga's partial success) — execution never returns an error, so the
//! session always comes back to an idle, resubmittable state.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::directory::DirectorySnapshot;
use crate::error::BackendError;
use crate::model::{
    ClientDraft, EventDraft, Intent, IntentAction, NewClient, NewEvent,
};
use crate::resolver::{resolve_client_reference, ClientRef};

/// Fixed clarification when an intent carries no message to show
pub const CLARIFICATION_MESSAGE: &str =
    "Não entendi. Pode reformular? Ex: 'Criar evento para Maria, casamento 15/03, valor 2500'";

const NO_CLIENTS_MESSAGE: &str = "Você ainda não tem clientes cadastrados.";
const NO_EVENTS_MESSAGE: &str = "Você ainda não tem eventos cadastrados.";

/// Listed events are capped like the production transcript was
const EVENT_LIST_LIMIT: usize = 10;

/// Execute a resolved intent against the backend.
///
/// List actions format the snapshot already in hand; no directory
/// re-read happens inside execution. The returned string is the
/// assistant's reply for the transcript.
pub async fn execute(
    intent: Intent,
    directory: &DirectorySnapshot,
    backend: &dyn Backend,
) -> String {
    match intent.action {
        IntentAction::Answer | IntentAction::Ask => intent
            .message
            .unwrap_or_else(|| CLARIFICATION_MESSAGE.to_string()),
        IntentAction::ListClients => list_clients(directory),
        IntentAction::ListEvents => list_events(directory),
        IntentAction::CreateClient => {
            create_client(intent.client, intent.message, backend).await
        }
        IntentAction::CreateEvent => {
            create_event(intent.event, intent.message, directory, backend).await
        }
        IntentAction::CreateBoth => {
            create_both(intent.client, intent.event, backend).await
        }
    }
}

fn list_clients(directory: &DirectorySnapshot) -> String {
    if directory.clients.is_empty() {
        return NO_CLIENTS_MESSAGE.to_string();
    }
    let lines: Vec<String> = directory
        .clients
        .iter()
        .map(|c| match &c.phone {
            Some(phone) => format!("• {} - {}", c.name, phone),
            None => format!("• {}", c.name),
        })
        .collect();
    format!(
        "Seus clientes ({}):\n{}",
        directory.clients.len(),
        lines.join("\n")
    )
}

fn list_events(directory: &DirectorySnapshot) -> String {
    if directory.events.is_empty() {
        return NO_EVENTS_MESSAGE.to_string();
    }
    let lines: Vec<String> = directory
        .events
        .iter()
        .take(EVENT_LIST_LIMIT)
        .map(|e| {
            format!(
                "• {} - {}",
                e.event_type,
                e.event_date.format("%d/%m/%Y")
            )
        })
        .collect();
    format!(
        "Seus eventos ({}):\n{}",
        directory.events.len(),
        lines.join("\n")
    )
}

async fn create_client(
    draft: Option<ClientDraft>,
    message: Option<String>,
    backend: &dyn Backend,
) -> String {
    let Some(payload) = client_payload(draft) else {
        return "Qual o nome do cliente?".to_string();
    };
    let name = payload.name.clone();

    match backend.create_client(payload).await {
        Ok(created) => {
            info!(client_id = %created.id, "client created");
            message.unwrap_or_else(|| format!("✅ Cliente {name} cadastrado!"))
        }
        Err(e) => failure_message(&e),
    }
}

async fn create_event(
    draft: Option<EventDraft>,
    message: Option<String>,
    directory: &DirectorySnapshot,
    backend: &dyn Backend,
) -> String {
    let Some(draft) = draft else {
        return CLARIFICATION_MESSAGE.to_string();
    };

    let Some(reference) =
        ClientRef::from_fields(draft.client_id.as_deref(), draft.client_name.as_deref())
    else {
        return "Para criar o evento, me diga o nome do cliente.\nEx: 'Criar evento para Maria Silva, casamento 15/03, valor 2500'".to_string();
    };

    // Never issue an event-create with an unresolved client reference.
    let Some(client_id) = resolve_client_reference(&reference, directory) else {
        warn!(reference = reference.display(), "client reference unresolved");
        return format!(
            "❌ Não encontrei o cliente \"{}\". Cadastre o cliente primeiro e tente de novo.",
            reference.display()
        );
    };

    let payload = match event_payload(&draft, client_id) {
        Ok(payload) => payload,
        Err(ask) => return ask,
    };

    match backend.create_event(payload).await {
        Ok(created) => {
            info!(event_id = %created.id, client_id = %created.client_id, "event created");
            message.unwrap_or_else(|| event_confirmation(&created.event_type, &created))
        }
        Err(e) => failure_message(&e),
    }
}

/// Two-step saga: create the client, then the event with the new id.
///
/// Client failure aborts the whole saga before the event step ("at most
/// one partial artifact"). Event failure after a created client reports
/// partial success; the client is not rolled back — the backend offers
/// no multi-object transaction.
async fn create_both(
    client_draft: Option<ClientDraft>,
    event_draft: Option<EventDraft>,
    backend: &dyn Backend,
) -> String {
    let Some(client_payload) = client_payload(client_draft) else {
        return "Qual o nome do cliente?".to_string();
    };
    let Some(event_draft) = event_draft else {
        return CLARIFICATION_MESSAGE.to_string();
    };

    let client = match backend.create_client(client_payload).await {
        Ok(created) => created,
        Err(e) => {
            warn!(error = %e, "saga aborted: client creation failed");
            return failure_message(&e);
        }
    };
    info!(client_id = %client.id, "saga step 1 done, client created");

    let payload = match event_payload(&event_draft, client.id.clone()) {
        Ok(payload) => payload,
        Err(_ask) => {
            // Client exists but the event cannot be built; report the
            // partial outcome rather than silently dropping it.
            return format!(
                "⚠️ Cliente {} cadastrado, mas faltou a data do evento. Me diga a data para eu agendar.",
                client.name
            );
        }
    };

    match backend.create_event(payload).await {
        Ok(created) => {
            info!(event_id = %created.id, "saga step 2 done, event created");
            format!(
                "✅ Cliente {} cadastrado e evento criado!\n🎯 Tipo: {}\n📅 Data: {}",
                client.name,
                created.event_type,
                created.event_date.format("%d/%m/%Y")
            )
        }
        Err(e) => {
            warn!(error = %e, client_id = %client.id, "saga partial: event creation failed");
            format!(
                "⚠️ Cliente {} cadastrado, mas não consegui criar o evento: {}",
                client.name,
                failure_detail(&e)
            )
        }
    }
}

/// Build the create-client payload; `None` when the draft has no name
fn client_payload(draft: Option<ClientDraft>) -> Option<NewClient> {
    let draft = draft?;
    let name = draft.name?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(NewClient {
        name,
        phone: draft.phone,
        email: draft.email,
        notes: draft.notes,
    })
}

/// Build the create-event payload, applying the fixed defaults.
///
/// Amounts arrive already coerced non-negative by the draft's lenient
/// deserializer. An unparsable or missing date yields an ask-style
/// message instead of a payload.
fn event_payload(draft: &EventDraft, client_id: String) -> Result<NewEvent, String> {
    let event_date = draft
        .event_date
        .as_deref()
        .and_then(parse_event_date)
        .ok_or_else(|| "Qual a data do evento?\nEx: 15/03 ou 2025-03-15T14:00:00".to_string())?;

    Ok(NewEvent {
        client_id,
        event_type: draft
            .event_type
            .clone()
            .unwrap_or_else(|| "Evento".to_string()),
        event_date,
        location: draft.location.clone(),
        total_value: draft.total_value.max(Decimal::ZERO),
        amount_paid: draft.amount_paid.max(Decimal::ZERO),
        remaining_installments: draft.remaining_installments.unwrap_or(1),
        notes: draft.notes.clone(),
        status: draft.status.unwrap_or_default(),
    })
}

/// Parse the model's ISO 8601 date output, tolerating a missing time
fn parse_event_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(dt);
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(9, 0, 0))
}

fn event_confirmation(event_type: &str, created: &crate::model::Event) -> String {
    let mut msg = format!(
        "✅ Evento criado com sucesso!\n🎯 Tipo: {}\n📅 Data: {}",
        event_type,
        created.event_date.format("%d/%m/%Y")
    );
    if created.total_value > Decimal::ZERO {
        msg.push_str(&format!("\n💰 Valor: R$ {}", created.total_value));
    }
    msg
}

/// User-facing failure text with the `❌` marker
fn failure_message(error: &BackendError) -> String {
    format!("❌ {}", failure_detail(error))
}

fn failure_detail(error: &BackendError) -> String {
    if error.is_unauthorized() {
        return "Você precisa estar logado.".to_string();
    }
    match error {
        BackendError::Api { detail, .. } if !detail.is_empty() => detail.clone(),
        other => other.to_string(),
    }
}
