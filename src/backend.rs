//! FOTIVA backend REST client
//!
//! The backend is an external collaborator with a fixed contract (base
//! path `/api`, bearer-token authenticated). The pipeline only ever
//! reads the directory and creates records; update/delete belong to the
//! CRUD screens and are deliberately absent from the trait.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::AssistantConfig;
use crate::error::{AssistantError, BackendError};
use crate::model::{Client, Event, NewClient, NewEvent};

/// Unified backend interface for directory reads and record creation
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_clients(&self) -> Result<Vec<Client>, BackendError>;
    async fn list_events(&self) -> Result<Vec<Event>, BackendError>;
    async fn create_client(&self, client: NewClient) -> Result<Client, BackendError>;
    async fn create_event(&self, event: NewEvent) -> Result<Event, BackendError>;
}

/// HTTP implementation of [`Backend`] against the FOTIVA REST API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: url::Url,
    token: Option<String>,
}

impl HttpBackend {
    /// Build from an [`AssistantConfig`]
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AssistantError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> url::Url {
        // Url::join treats a base without a trailing slash as a file,
        // so build the path by hand to keep "/api" + "/clients" intact.
        let mut url = self.base_url.clone();
        let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Convert a non-2xx response into an API error, extracting the
    /// backend's `{"detail": ...}` body when present.
    async fn into_api_error(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or(body);
        BackendError::Api { status, detail }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path);
        debug!(%url, "backend GET");
        let response = self.authorize(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path);
        debug!(%url, "backend POST");
        let response = self
            .authorize(self.client.post(url))
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_clients(&self) -> Result<Vec<Client>, BackendError> {
        self.get_json("clients").await
    }

    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        self.get_json("events").await
    }

    async fn create_client(&self, client: NewClient) -> Result<Client, BackendError> {
        self.post_json("clients", &client).await
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, BackendError> {
        self.post_json("events", &event).await
    }
}

/// Scriptable in-memory backend for tests and demos.
///
/// Records every create call and can be told to fail either create
/// endpoint, which is how the saga's partial-failure paths are
/// exercised without a live server.
#[derive(Default)]
pub struct MockBackend {
    inner: std::sync::Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    clients: Vec<Client>,
    events: Vec<Event>,
    created_clients: Vec<NewClient>,
    created_events: Vec<NewEvent>,
    fail_create_client: Option<String>,
    fail_create_event: Option<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory with existing clients
    pub fn with_clients(self, clients: Vec<Client>) -> Self {
        self.inner.lock().unwrap().clients = clients;
        self
    }

    /// Seed the directory with existing events
    pub fn with_events(self, events: Vec<Event>) -> Self {
        self.inner.lock().unwrap().events = events;
        self
    }

    /// Make every `create_client` call fail with the given detail
    pub fn fail_create_client(self, detail: &str) -> Self {
        self.inner.lock().unwrap().fail_create_client = Some(detail.to_string());
        self
    }

    /// Make every `create_event` call fail with the given detail
    pub fn fail_create_event(self, detail: &str) -> Self {
        self.inner.lock().unwrap().fail_create_event = Some(detail.to_string());
        self
    }

    /// Payloads accepted by `create_client` so far
    pub fn created_clients(&self) -> Vec<NewClient> {
        self.inner.lock().unwrap().created_clients.clone()
    }

    /// Payloads accepted by `create_event` so far
    pub fn created_events(&self) -> Vec<NewEvent> {
        self.inner.lock().unwrap().created_events.clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_clients(&self) -> Result<Vec<Client>, BackendError> {
        Ok(self.inner.lock().unwrap().clients.clone())
    }

    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        Ok(self.inner.lock().unwrap().events.clone())
    }

    async fn create_client(&self, client: NewClient) -> Result<Client, BackendError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(detail) = &state.fail_create_client {
            return Err(BackendError::Api {
                status: 500,
                detail: detail.clone(),
            });
        }
        let created = Client {
            id: uuid::Uuid::new_v4().to_string(),
            name: client.name.clone(),
            phone: client.phone.clone(),
            email: client.email.clone(),
            notes: client.notes.clone(),
            created_at: chrono::Utc::now(),
        };
        state.created_clients.push(client);
        state.clients.push(created.clone());
        Ok(created)
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, BackendError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(detail) = &state.fail_create_event {
            return Err(BackendError::Api {
                status: 500,
                detail: detail.clone(),
            });
        }
        let created = Event {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: event.client_id.clone(),
            event_type: event.event_type.clone(),
            event_date: event.event_date,
            location: event.location.clone(),
            total_value: event.total_value,
            amount_paid: event.amount_paid,
            remaining_installments: event.remaining_installments,
            notes: event.notes.clone(),
            status: event.status,
        };
        state.created_events.push(event);
        state.events.push(created.clone());
        Ok(created)
    }
}
