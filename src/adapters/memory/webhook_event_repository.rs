//! In-memory implementation of WebhookEventRepository.
//!
//! The idempotency check and the insert happen under one write lock, which
//! gives the same guarantee as the unique constraint in PostgreSQL.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, WebhookEventId};
use crate::domain::webhook::{WebhookEvent, WebhookStatus};
use crate::ports::{SaveResult, WebhookEventRepository};

#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    events: RwLock<HashMap<WebhookEventId, WebhookEvent>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<WebhookEvent> {
        self.events.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_id(&self, id: WebhookEventId) -> Result<Option<WebhookEvent>, DomainError> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn find_by_provider_event(
        &self,
        gateway_name: &str,
        provider_event_id: &str,
    ) -> Result<Option<WebhookEvent>, DomainError> {
        Ok(self
            .events
            .read()
            .await
            .values()
            .find(|e| e.gateway_name == gateway_name && e.provider_event_id == provider_event_id)
            .cloned())
    }

    async fn insert_if_absent(&self, event: &WebhookEvent) -> Result<SaveResult, DomainError> {
        let mut events = self.events.write().await;
        if let Some(existing) = events.values().find(|e| {
            e.gateway_name == event.gateway_name && e.provider_event_id == event.provider_event_id
        }) {
            return Ok(SaveResult::AlreadyExists(existing.clone()));
        }
        events.insert(event.id, event.clone());
        Ok(SaveResult::Inserted)
    }

    async fn claim(&self, event: &WebhookEvent, expected_attempts: u32) -> Result<bool, DomainError> {
        let mut events = self.events.write().await;
        match events.get_mut(&event.id) {
            Some(stored) if stored.is_dispatchable() && stored.attempts == expected_attempts => {
                *stored = event.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::new(
                ErrorCode::WebhookEventNotFound,
                format!("Webhook event not found: {}", event.id),
            )),
        }
    }

    async fn update(&self, event: &WebhookEvent) -> Result<(), DomainError> {
        let mut events = self.events.write().await;
        match events.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::WebhookEventNotFound,
                format!("Webhook event not found: {}", event.id),
            )),
        }
    }

    async fn find_failed(&self, limit: usize) -> Result<Vec<WebhookEvent>, DomainError> {
        let mut failed: Vec<WebhookEvent> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| e.status == WebhookStatus::Failed)
            .cloned()
            .collect();
        failed.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        failed.truncate(limit);
        Ok(failed)
    }

    async fn delete_settled_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|_, e| {
            let settled = matches!(e.status, WebhookStatus::Processed | WebhookStatus::Ignored);
            !(settled && e.created_at.is_before(&cutoff))
        });
        Ok((before - events.len()) as u64)
    }
}
