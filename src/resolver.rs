//! Entity reconciliation against the directory snapshot
//!
//! Matches a free-text client reference from an intent to an existing
//! record. Matching is case/accent-insensitive substring containment,
//! first hit in directory order — deliberately not a ranking algorithm.
//! The resolver never fabricates an id and never auto-creates a client
//! from an ambiguous match.

use crate::directory::DirectorySnapshot;
use crate::model::{Client, RecordId};
use crate::normalize::contains_folded;

/// A client reference carried by an event draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRef {
    /// Backend id echoed from the directory digest; trusted upstream
    Id(RecordId),
    /// Free-text name needing reconciliation
    Name(String),
}

impl ClientRef {
    /// Build from an event draft's optional fields; `client_id` wins
    pub fn from_fields(id: Option<&str>, name: Option<&str>) -> Option<Self> {
        match (id, name) {
            (Some(id), _) if !id.trim().is_empty() => Some(ClientRef::Id(id.to_string())),
            (_, Some(name)) if !name.trim().is_empty() => {
                Some(ClientRef::Name(name.to_string()))
            }
            _ => None,
        }
    }

    /// The reference as the user phrased it, for error messages
    pub fn display(&self) -> &str {
        match self {
            ClientRef::Id(id) => id,
            ClientRef::Name(name) => name,
        }
    }
}

/// Resolve a client reference against the directory snapshot.
///
/// An id reference short-circuits to that id without lookup. A name
/// reference returns the **first** client, in directory order, whose
/// name contains the reference (normalized). Zero matches is `None`.
pub fn resolve_client_reference(
    reference: &ClientRef,
    directory: &DirectorySnapshot,
) -> Option<RecordId> {
    match reference {
        ClientRef::Id(id) => Some(id.clone()),
        ClientRef::Name(name) => find_by_name(name, &directory.clients).map(|c| c.id.clone()),
    }
}

fn find_by_name<'a>(name: &str, clients: &'a [Client]) -> Option<&'a Client> {
    clients.iter().find(|c| contains_folded(&c.name, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Client;

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

    fn directory(clients: Vec<Client>) -> DirectorySnapshot {
        DirectorySnapshot {
            clients,
            events: vec![],
        }
    }

    #[test]
    fn id_reference_short_circuits() {
        // Id is trusted even when the snapshot does not contain it
        let dir = directory(vec![]);
        let resolved = resolve_client_reference(&ClientRef::Id("c42".to_string()), &dir);
        assert_eq!(resolved.as_deref(), Some("c42"));
    }

    #[test]
    fn substring_match_in_directory_order() {
        let dir = directory(vec![
            client("1", "Maria Silva"),
            client("2", "Maria Souza"),
        ]);
        // Both contain "Maria"; first in directory order wins
        let resolved =
            resolve_client_reference(&ClientRef::Name("Maria".to_string()), &dir);
        assert_eq!(resolved.as_deref(), Some("1"));
    }

    #[test]
    fn accents_and_case_are_ignored() {
        let dir = directory(vec![client("1", "João Pedro")]);
        for reference in ["joao", "JOÃO", "João"] {
            let resolved =
                resolve_client_reference(&ClientRef::Name(reference.to_string()), &dir);
            assert_eq!(resolved.as_deref(), Some("1"), "reference {reference}");
        }
    }

    #[test]
    fn no_match_is_none_never_fabricated() {
        let dir = directory(vec![client("1", "Maria Silva")]);
        let resolved =
            resolve_client_reference(&ClientRef::Name("Carlos".to_string()), &dir);
        assert!(resolved.is_none());
    }

    #[test]
    fn ref_from_fields_prefers_id() {
        assert_eq!(
            ClientRef::from_fields(Some("c1"), Some("Maria")),
            Some(ClientRef::Id("c1".to_string()))
        );
        assert_eq!(
            ClientRef::from_fields(None, Some("Maria")),
            Some(ClientRef::Name("Maria".to_string()))
        );
        assert_eq!(ClientRef::from_fields(Some("  "), None), None);
    }
}
