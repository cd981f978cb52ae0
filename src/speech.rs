//! Speech capture and hands-free submission
//!
//! Voice input is an optional capability: when no capture backend is
//! available the rest of the assistant works unchanged over typed text.
//! Finalized transcript segments accumulate in a buffer, and a
//! debounce timer turns a pause in speech into an automatic submission.
//! Any new segment or a manual send cancels the pending timer.

use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{AssistantError, Result};

/// Silence window after the last finalized segment before auto-submit
pub const AUTO_SUBMIT_DELAY: Duration = Duration::from_millis(1500);

/// A recognition result from the capture backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Provisional text, shown live but never submitted
    Interim(String),
    /// Finalized segment, appended to the pending utterance
    Final(String),
}

/// A source of speech recognition events
#[async_trait]
pub trait SpeechCapture: Send {
    /// Start listening on the microphone
    async fn start(&mut self) -> Result<()>;
    /// Stop listening; pending buffer content is left to the caller
    async fn stop(&mut self);
    /// Next recognition event, or `None` once capture has ended
    async fn next_event(&mut self) -> Option<TranscriptEvent>;
}

static UNAVAILABLE_REPORTED: Once = Once::new();

/// Probe for a speech capture backend.
///
/// No microphone integration is wired into this build, so this returns
/// `None`; the unavailability is logged once per process, not per call.
pub fn detect_capture() -> Option<Box<dyn SpeechCapture>> {
    UNAVAILABLE_REPORTED.call_once(|| {
        warn!("no speech capture backend available, voice input disabled");
    });
    None
}

/// The error surfaced when voice input is requested without a backend
pub fn capture_unavailable() -> AssistantError {
    AssistantError::CapabilityUnavailable("speech capture")
}

/// Accumulates finalized segments into the pending utterance
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    pending: String,
    interim: String,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized segment
    pub fn push_final(&mut self, segment: &str) {
        let segment = segment.trim();
        if segment.is_empty() {
            return;
        }
        if !self.pending.is_empty() {
            self.pending.push(' ');
        }
        self.pending.push_str(segment);
        self.interim.clear();
    }

    /// Replace the provisional tail (display only)
    pub fn set_interim(&mut self, text: &str) {
        self.interim = text.trim().to_string();
    }

    /// Pending utterance plus provisional tail, for live display
    pub fn display(&self) -> String {
        match (self.pending.is_empty(), self.interim.is_empty()) {
            (true, _) => self.interim.clone(),
            (_, true) => self.pending.clone(),
            _ => format!("{} {}", self.pending, self.interim),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain the pending utterance for submission
    pub fn take(&mut self) -> String {
        self.interim.clear();
        std::mem::take(&mut self.pending)
    }
}

/// Debounced auto-submit timer.
///
/// `schedule` arms (or re-arms) a timer that sends the utterance into
/// the sink after the configured silence window. Re-arming or
/// cancelling aborts the in-flight timer, so at most one submission can
/// result from a burst of segments.
pub struct AutoSubmit {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl AutoSubmit {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Arm the timer, replacing any previously armed one
    pub fn schedule(&mut self, utterance: String, sink: mpsc::Sender<String>) {
        self.cancel();
        let delay = self.delay;
        debug!(?delay, "auto-submit armed");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sink.send(utterance).await.is_err() {
                debug!("auto-submit sink closed, utterance dropped");
            }
        }));
    }

    /// Abort the armed timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AutoSubmit {
    fn drop(&mut self) {
        self.cancel();
    }
}
