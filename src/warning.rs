//! User-visible warnings emitted while a lookup is backing off.
//!
//! A warning is the only signal an operator gets that a retry is pending, so
//! sinks must neither block the invoker nor discard messages silently.
//!
//! | Sink | Destination |
//! |------|-------------|
//! | [`TracingWarningSink`] | `tracing::warn!` (default) |
//! | [`ConsoleWarningSink`] | stderr, with a prefix |
//! | [`ChannelWarningSink`] | unbounded channel read by a UI task |
//! | [`InMemoryWarningSink`] | in-memory list, for tests |
//! | [`CompositeWarningSink`] | fan-out to several sinks |

use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;

/// Fire-and-forget destination for retry warnings.
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Logs warnings through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "chat_search::warning", "{}", message);
    }
}

/// Console sink for command-line use.
pub struct ConsoleWarningSink {
    prefix: String,
}

impl ConsoleWarningSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for ConsoleWarningSink {
    fn default() -> Self {
        Self::new("[warning]")
    }
}

impl WarningSink for ConsoleWarningSink {
    fn warn(&self, message: &str) {
        eprintln!("{} {}", self.prefix, message);
    }
}

/// Forwards warnings to an unbounded channel.
///
/// Sending never waits. If the receiver is gone the message falls back to
/// `tracing` instead of vanishing.
#[derive(Clone)]
pub struct ChannelWarningSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelWarningSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl WarningSink for ChannelWarningSink {
    fn warn(&self, message: &str) {
        if let Err(mpsc::error::SendError(message)) = self.tx.send(message.to_string()) {
            TracingWarningSink.warn(&message);
        }
    }
}

/// In-memory sink for testing.
#[derive(Default)]
pub struct InMemoryWarningSink {
    messages: RwLock<Vec<String>>,
}

impl InMemoryWarningSink {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
    pub fn clear(&self) {
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarningSink for InMemoryWarningSink {
    fn warn(&self, message: &str) {
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Composite sink for multiple destinations.
#[derive(Default)]
pub struct CompositeWarningSink {
    sinks: Vec<Arc<dyn WarningSink>>,
}

impl CompositeWarningSink {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add_sink(mut self, sink: Arc<dyn WarningSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl WarningSink for CompositeWarningSink {
    fn warn(&self, message: &str) {
        for s in &self.sinks {
            s.warn(message);
        }
    }
}
