//! Directory Snapshot
//!
//! Read-only, per-submission view of the caller's known clients and
//! events. Always fetched fresh at the start of an interpretation cycle
//! and never cached across turns — backend state may change between
//! submissions, and staleness bugs are worse than the extra reads.

use tracing::warn;

use crate::backend::Backend;
use crate::model::{Client, Event};

/// Maximum client lines included in the generative prompt digest
const DIGEST_CLIENT_LIMIT: usize = 100;

/// Maximum events included in the generative prompt digest
const DIGEST_EVENT_LIMIT: usize = 5;

/// Point-in-time read of all clients/events visible to the current user
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub clients: Vec<Client>,
    pub events: Vec<Event>,
}

impl DirectorySnapshot {
    /// Fetch both directory reads concurrently.
    ///
    /// Ordering between the two reads is irrelevant; both must complete
    /// before interpretation starts. An individual read failure degrades
    /// to an empty collection rather than aborting the submission.
    pub async fn fetch(backend: &dyn Backend) -> Self {
        let (clients, events) = tokio::join!(backend.list_clients(), backend.list_events());

        let clients = clients.unwrap_or_else(|e| {
            warn!(error = %e, "client directory read failed, treating as empty");
            Vec::new()
        });
        let events = events.unwrap_or_else(|e| {
            warn!(error = %e, "event directory read failed, treating as empty");
            Vec::new()
        });

        Self { clients, events }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty() && self.events.is_empty()
    }

    /// Bounded text digest of the directory for the generative context.
    ///
    /// Lists known client names with their ids (so the model can echo an
    /// id back instead of a name) and the most recent events, newest
    /// first, capped at [`DIGEST_EVENT_LIMIT`].
    pub fn digest(&self) -> String {
        let mut out = String::new();

        if self.clients.is_empty() {
            out.push_str("Clientes cadastrados: nenhum\n");
        } else {
            out.push_str(&format!(
                "Clientes cadastrados ({}):\n",
                self.clients.len()
            ));
            for client in self.clients.iter().take(DIGEST_CLIENT_LIMIT) {
                out.push_str(&format!("- {} (id: {})\n", client.name, client.id));
            }
        }

        if self.events.is_empty() {
            out.push_str("Eventos agendados: nenhum\n");
        } else {
            let mut recent: Vec<&Event> = self.events.iter().collect();
            recent.sort_by(|a, b| b.event_date.cmp(&a.event_date));
            out.push_str(&format!(
                "Eventos agendados ({}, mais recentes):\n",
                self.events.len()
            ));
            for event in recent.into_iter().take(DIGEST_EVENT_LIMIT) {
                out.push_str(&format!(
                    "- {} em {} (cliente id: {})\n",
                    event.event_type,
                    event.event_date.format("%Y-%m-%d"),
                    event.client_id
                ));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::model::EventStatus;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn client(id: &str, name: &str) -> Client {
        Client {
            id: id.to_string(),
            name: name.to_string(),
            phone: None,
            email: None,
            notes: None,
            created_at: chrono::Utc::now(),
        }
    }

    fn event(id: &str, client_id: &str, event_type: &str, date: (i32, u32, u32)) -> Event {
        Event {
            id: id.to_string(),
            client_id: client_id.to_string(),
            event_type: event_type.to_string(),
            event_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            location: None,
            total_value: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            remaining_installments: 1,
            notes: None,
            status: EventStatus::Confirmado,
        }
    }

    #[tokio::test]
    async fn fetch_collects_both_reads() {
        let backend = MockBackend::new()
            .with_clients(vec![client("c1", "Maria Silva")])
            .with_events(vec![event("e1", "c1", "Casamento", (2025, 3, 15))]);

        let snapshot = DirectorySnapshot::fetch(&backend).await;
        assert_eq!(snapshot.clients.len(), 1);
        assert_eq!(snapshot.events.len(), 1);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn digest_empty_directory() {
        let snapshot = DirectorySnapshot::default();
        let digest = snapshot.digest();
        assert!(digest.contains("Clientes cadastrados: nenhum"));
        assert!(digest.contains("Eventos agendados: nenhum"));
    }

    #[test]
    fn digest_lists_names_with_ids() {
        let snapshot = DirectorySnapshot {
            clients: vec![client("c1", "Maria Silva"), client("c2", "João Pedro")],
            events: vec![],
        };
        let digest = snapshot.digest();
        assert!(digest.contains("- Maria Silva (id: c1)"));
        assert!(digest.contains("- João Pedro (id: c2)"));
    }

    #[test]
    fn digest_caps_events_at_five_most_recent() {
        let events = (1..=8)
            .map(|day| event(&format!("e{day}"), "c1", "Ensaio", (2025, 6, day)))
            .collect();
        let snapshot = DirectorySnapshot {
            clients: vec![client("c1", "Maria")],
            events,
        };
        let digest = snapshot.digest();

        // Newest five (days 4..=8) survive the cap
        assert!(digest.contains("2025-06-08"));
        assert!(digest.contains("2025-06-04"));
        assert!(!digest.contains("2025-06-03"));
    }
}
