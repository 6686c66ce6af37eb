//! Webhook processor - idempotent ingestion and dispatch.
//!
//! 1. Look up `(gateway, provider_event_id)`; a hit is returned unchanged.
//! 2. Otherwise store a new `Pending` event (insert-or-return-existing).
//! 3. Claim the event (`Processing`). Only the caller whose claim lands
//!    runs a handler; everyone else gets the stored event back.
//! 4. Dispatch on the normalized event type. No handler means `Ignored`.
//! 5. Record `Processed` or `Failed` and persist. Failures are propagated
//!    after the row is saved so the event stays a retry candidate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::{WebhookError, WebhookEvent, WebhookEventType};
use crate::domain::foundation::{Timestamp, WebhookEventId};
use crate::ports::{SaveResult, WebhookEventRepository};

/// Handles one or more normalized webhook event types.
///
/// Handlers must tolerate seeing the same event twice (retries) and should
/// return `WebhookError::Ignored` when the event does not apply.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    fn handles(&self) -> Vec<WebhookEventType>;

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError>;
}

/// Routes events to handlers.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    fn get_handler(&self, event_type: &WebhookEventType) -> Option<&dyn WebhookEventHandler>;

    /// Returns `Err(WebhookError::Ignored)` when no handler is registered.
    async fn dispatch(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        match self.get_handler(&event.event_type) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "no handler registered for {}",
                event.event_type
            ))),
        }
    }
}

/// Dispatch table keyed by event type. Later registrations win.
#[derive(Default)]
pub struct WebhookHandlerRegistry {
    handlers: HashMap<WebhookEventType, Arc<dyn WebhookEventHandler>>,
}

impl WebhookHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        for event_type in handler.handles() {
            self.handlers.insert(event_type, Arc::clone(&handler));
        }
        self
    }

    pub fn handled_types(&self) -> Vec<WebhookEventType> {
        WebhookEventType::ALL
            .into_iter()
            .filter(|t| self.handlers.contains_key(t))
            .collect()
    }
}

#[async_trait]
impl WebhookDispatcher for WebhookHandlerRegistry {
    fn get_handler(&self, event_type: &WebhookEventType) -> Option<&dyn WebhookEventHandler> {
        self.handlers.get(event_type).map(|h| h.as_ref())
    }
}

/// A webhook delivery as received at ingress.
#[derive(Debug, Clone)]
pub struct IncomingWebhook {
    pub gateway_name: String,
    pub provider_event_id: String,
    /// Provider's event name, classified by the processor.
    pub event_type: String,
    pub payload: String,
    pub signature: Option<String>,
    pub source_ip: Option<String>,
}

/// Result of a retry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrySummary {
    pub retried: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct WebhookProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    dispatcher: Arc<dyn WebhookDispatcher>,
}

impl WebhookProcessor {
    pub fn new(
        repository: Arc<dyn WebhookEventRepository>,
        dispatcher: Arc<dyn WebhookDispatcher>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Processes a delivery at most once per idempotency key.
    ///
    /// A duplicate delivery returns the stored event without dispatching.
    ///
    /// # Errors
    ///
    /// - `MissingField` when the gateway name or provider event id is empty
    /// - `ProcessingFailed` when a handler failed (the event is stored as failed)
    /// - `Database` for storage failures
    pub async fn process(&self, incoming: IncomingWebhook) -> Result<WebhookEvent, WebhookError> {
        if incoming.gateway_name.trim().is_empty() {
            return Err(WebhookError::MissingField("gateway_name"));
        }
        if incoming.provider_event_id.trim().is_empty() {
            return Err(WebhookError::MissingField("event_id"));
        }

        if let Some(existing) = self
            .repository
            .find_by_provider_event(&incoming.gateway_name, &incoming.provider_event_id)
            .await?
        {
            tracing::debug!(
                gateway = %incoming.gateway_name,
                provider_event_id = %incoming.provider_event_id,
                status = %existing.status,
                "Duplicate webhook delivery"
            );
            return Ok(existing);
        }

        let event = WebhookEvent::receive(
            incoming.gateway_name,
            incoming.provider_event_id,
            WebhookEventType::from_provider(&incoming.event_type),
            incoming.payload,
        )
        .with_signature(incoming.signature)
        .with_source_ip(incoming.source_ip);

        match self.repository.insert_if_absent(&event).await? {
            SaveResult::Inserted => {}
            SaveResult::AlreadyExists(winner) => {
                tracing::debug!(
                    webhook_event_id = %winner.id,
                    "Lost insert race for webhook delivery"
                );
                return Ok(winner);
            }
        }

        tracing::info!(
            webhook_event_id = %event.id,
            gateway = %event.gateway_name,
            event_type = %event.event_type,
            "Webhook received"
        );
        let id = event.id;
        match self.claim(event).await? {
            Some(claimed) => self.run_dispatch(claimed).await,
            None => self.stored(id).await,
        }
    }

    /// Re-dispatches a pending or failed event.
    ///
    /// Settled events, and events another caller is already dispatching,
    /// are returned as stored without running a handler.
    pub async fn retry(&self, id: WebhookEventId) -> Result<WebhookEvent, WebhookError> {
        let event = self.stored(id).await?;

        if !event.is_dispatchable() {
            return Ok(event);
        }
        match self.claim(event).await? {
            Some(claimed) => self.run_dispatch(claimed).await,
            None => self.stored(id).await,
        }
    }

    /// Retries up to `limit` failed events, oldest first.
    ///
    /// Events claimed elsewhere in the meantime are skipped and not counted.
    pub async fn retry_failed(&self, limit: usize) -> Result<RetrySummary, WebhookError> {
        let mut summary = RetrySummary::default();
        for candidate in self.repository.find_failed(limit).await? {
            let Some(event) = self.claim(candidate).await? else {
                continue;
            };
            summary.retried += 1;
            match self.run_dispatch(event).await {
                Ok(_) => summary.succeeded += 1,
                Err(err) => {
                    summary.failed += 1;
                    tracing::warn!(error = %err, "Webhook retry failed");
                }
            }
        }
        Ok(summary)
    }

    /// Deletes processed and ignored events created before `cutoff`.
    pub async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, WebhookError> {
        let deleted = self.repository.delete_settled_before(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted, "Purged settled webhook events");
        }
        Ok(deleted)
    }

    async fn stored(&self, id: WebhookEventId) -> Result<WebhookEvent, WebhookError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(WebhookError::NotFound(id))
    }

    /// Moves the event to `Processing` in storage. `None` means another
    /// caller got there first.
    async fn claim(&self, mut event: WebhookEvent) -> Result<Option<WebhookEvent>, WebhookError> {
        let expected_attempts = event.attempts;
        event
            .begin_attempt()
            .map_err(|e| WebhookError::InvalidTransition(e.message))?;

        if self.repository.claim(&event, expected_attempts).await? {
            Ok(Some(event))
        } else {
            tracing::debug!(webhook_event_id = %event.id, "Webhook event already claimed");
            Ok(None)
        }
    }

    /// Runs the handler for an event this caller has claimed.
    async fn run_dispatch(&self, mut event: WebhookEvent) -> Result<WebhookEvent, WebhookError> {
        let outcome = self.dispatcher.dispatch(&event).await;

        let failure = match outcome {
            Ok(()) => {
                event.mark_processed()?;
                None
            }
            Err(WebhookError::Ignored(reason)) => {
                tracing::debug!(webhook_event_id = %event.id, reason = %reason, "Webhook ignored");
                event.mark_ignored(reason)?;
                None
            }
            Err(err) => {
                let reason = err.to_string();
                event.mark_failed(reason.clone())?;
                Some(reason)
            }
        };

        self.repository.update(&event).await?;

        match failure {
            None => Ok(event),
            Some(reason) => {
                tracing::warn!(
                    webhook_event_id = %event.id,
                    gateway = %event.gateway_name,
                    event_type = %event.event_type,
                    attempts = event.attempts,
                    error = %reason,
                    "Webhook handler failed"
                );
                Err(WebhookError::ProcessingFailed {
                    event_id: event.id,
                    reason,
                })
            }
        }
    }
}
