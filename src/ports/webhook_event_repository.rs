//! WebhookEventRepository port - durable store and idempotency key for
//! provider webhooks.
//!
//! Providers redeliver on timeouts and 5xx answers, and sometimes for no
//! reason at all. The `(gateway_name, provider_event_id)` pair must be unique
//! in storage, and `insert_if_absent` must check and insert atomically so two
//! concurrent deliveries of one event cannot both be stored.
//!
//! Dispatch is guarded separately by `claim`: a retry, the retry sweep and the
//! first delivery may all hold the same stored row, and only the caller whose
//! claim lands runs the handler.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, WebhookEventId};
use crate::domain::webhook::WebhookEvent;

/// Outcome of `insert_if_absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveResult {
    /// First sighting; the given event was stored.
    Inserted,
    /// Another delivery got there first; this is the stored event.
    AlreadyExists(WebhookEvent),
}

#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_id(&self, id: WebhookEventId) -> Result<Option<WebhookEvent>, DomainError>;

    /// Looks up the idempotency key.
    async fn find_by_provider_event(
        &self,
        gateway_name: &str,
        provider_event_id: &str,
    ) -> Result<Option<WebhookEvent>, DomainError>;

    /// Inserts unless an event with the same idempotency key exists.
    ///
    /// Implementations use a unique constraint with `ON CONFLICT DO NOTHING`
    /// (or a single lock scope) and return the winner on conflict.
    async fn insert_if_absent(&self, event: &WebhookEvent) -> Result<SaveResult, DomainError>;

    /// Conditionally stores a claimed event (`Processing`, attempts bumped).
    ///
    /// Succeeds only while the stored row is still `Pending` or `Failed` with
    /// `expected_attempts` attempts. Returns false when another caller
    /// claimed it first; nothing is written then.
    async fn claim(&self, event: &WebhookEvent, expected_attempts: u32) -> Result<bool, DomainError>;

    /// Persists status, error and attempt changes of a stored event.
    async fn update(&self, event: &WebhookEvent) -> Result<(), DomainError>;

    /// Failed events, oldest first.
    async fn find_failed(&self, limit: usize) -> Result<Vec<WebhookEvent>, DomainError>;

    /// Deletes processed and ignored events created before `cutoff`.
    ///
    /// Failed and pending events are kept. Returns the number deleted.
    async fn delete_settled_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn WebhookEventRepository) {}

    #[test]
    fn save_result_carries_existing_event() {
        let existing = WebhookEvent::receive(
            "Stripe",
            "evt_1",
            crate::domain::webhook::WebhookEventType::Unknown,
            "{}",
        );
        let result = SaveResult::AlreadyExists(existing.clone());
        assert_eq!(result, SaveResult::AlreadyExists(existing));
        assert_ne!(SaveResult::Inserted, result);
    }
}
