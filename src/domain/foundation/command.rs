//! Command infrastructure for CQRS handlers.
//!
//! `CommandMetadata` is the context that flows through every command handler
//! and is stamped onto the events the handler publishes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EventEnvelope;

/// Metadata context for command handlers.
///
/// ```ignore
/// let metadata = CommandMetadata::new("order-service").with_correlation_id(request_id);
/// handler.handle(cmd, metadata).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Caller that issued the command (service name or admin identity).
    pub actor: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,

    /// Source of this command (e.g., "api", "webhook", "scheduler").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates new command metadata for the given actor.
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            correlation_id: None,
            trace_id: None,
            source: None,
        }
    }

    /// Metadata for work the service initiates itself.
    pub fn system(source: impl Into<String>) -> Self {
        Self::new("system").with_source(source)
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Add trace ID for distributed tracing.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the trace ID if set.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Copies correlation context onto an outgoing event envelope.
    pub fn stamp(&self, envelope: EventEnvelope) -> EventEnvelope {
        let envelope = envelope
            .with_correlation_id(self.correlation_id())
            .with_user_id(self.actor.clone());
        match self.trace_id() {
            Some(trace) => envelope.with_trace_id(trace),
            None => envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain_sets_all_fields() {
        let metadata = CommandMetadata::new("order-service")
            .with_correlation_id("corr-123")
            .with_trace_id("trace-456")
            .with_source("api");

        assert_eq!(metadata.correlation_id(), "corr-123");
        assert_eq!(metadata.trace_id(), Some("trace-456"));
        assert_eq!(metadata.source(), Some("api"));
    }

    #[test]
    fn correlation_id_generates_if_missing() {
        let metadata = CommandMetadata::system("scheduler");
        assert!(!metadata.correlation_id().is_empty());
        assert_eq!(metadata.actor, "system");
    }

    #[test]
    fn stamp_copies_context_onto_envelope() {
        let metadata = CommandMetadata::new("admin")
            .with_correlation_id("corr-1")
            .with_trace_id("trace-1");
        let envelope = EventEnvelope::new("payment.created", "p-1", "Payment", serde_json::json!({}));

        let stamped = metadata.stamp(envelope);

        assert_eq!(stamped.metadata.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(stamped.metadata.user_id.as_deref(), Some("admin"));
        assert_eq!(stamped.metadata.trace_id.as_deref(), Some("trace-1"));
    }
}
