//! FOTIVA Assistant - Intent Pipeline
//!
//! Chat assistant for the FOTIVA photographer CRM. Each utterance flows
//! through a single pipeline:
//! Utterance -> Interpreter -> Intent -> Entity Resolution -> Execution -> Transcript
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fotiva_assistant::{build_interpreter, AssistantConfig, ConversationSession, HttpBackend};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AssistantConfig::from_env()?;
//! let interpreter = build_interpreter(&config)?;
//! let backend = HttpBackend::new(&config)?;
//! let mut session = ConversationSession::new(interpreter, Box::new(backend));
//! let reply = session.submit("meus clientes").await;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Configuration from the environment
pub mod config;

// Wire-level data model
pub mod model;

// Text normalization for matching
pub mod normalize;

// Per-turn directory snapshot
pub mod directory;

// Utterance -> Intent strategies
pub mod interpreter;

// Client reference reconciliation
pub mod resolver;

// REST backend client and test double
pub mod backend;

// Intent execution state machine
pub mod executor;

// Transcript and turn orchestration
pub mod session;

// Optional voice input
pub mod speech;

// Public re-exports for the pipeline surface
pub use backend::{Backend, HttpBackend, MockBackend};
pub use config::{AssistantConfig, InterpreterKind};
pub use directory::DirectorySnapshot;
pub use error::{AssistantError, BackendError, Result};
pub use interpreter::{build_interpreter, Interpreter};
pub use model::{Client, Event, Intent, IntentAction};
pub use resolver::{resolve_client_reference, ClientRef};
pub use session::{ChatMessage, ConversationSession, Speaker};
