//! Error taxonomy for the assistant pipeline
//!
//! Every variant is local to a single submission: the session catches
//! them, turns them into user-facing text, and returns to an idle,
//! resubmittable state. Nothing here is fatal to the process.

use thiserror::Error;

/// Main error type for the assistant pipeline
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Structured model output did not parse as a well-formed Intent.
    /// Recovered locally by surfacing a clarification request instead of
    /// guessing.
    #[error("model output could not be parsed as an intent: {0}")]
    Parse(String),

    /// A referenced client name has no match in the directory snapshot
    #[error("no client matching '{reference}' in the directory")]
    EntityNotFound { reference: String },

    /// A backend call failed (network error or non-2xx)
    #[error("backend call failed: {0}")]
    Backend(#[from] BackendError),

    /// A runtime capability (e.g. speech capture) is unavailable.
    /// Detected upfront and reported once; the feature is disabled, not
    /// retried.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// Missing or invalid configuration at construction time
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from backend REST calls
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `detail` is the backend-provided message when
    /// the body carried one, else the raw body
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },
}

impl BackendError {
    /// HTTP status of the failure, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http(e) => e.status().map(|s| s.as_u16()),
            BackendError::Api { status, .. } => Some(*status),
        }
    }

    /// Whether the failure was an authentication rejection
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Convenience result alias used across the crate
pub type Result<T> = std::result::Result<T, AssistantError>;
