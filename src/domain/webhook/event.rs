//! WebhookEvent entity: one observed provider callback.

use serde::{Deserialize, Serialize};

use super::{WebhookEventType, WebhookStatus};
use crate::domain::foundation::{DomainError, ErrorCode, StateMachine, Timestamp, WebhookEventId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: WebhookEventId,
    pub gateway_name: String,
    /// Provider's own id; unique together with `gateway_name`.
    pub provider_event_id: String,
    pub event_type: WebhookEventType,
    /// Raw body, stored verbatim for replay and audit.
    pub payload: String,
    pub status: WebhookStatus,
    pub processed_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub signature: Option<String>,
    pub source_ip: Option<String>,
    /// Number of dispatch attempts started.
    pub attempts: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WebhookEvent {
    /// Records a first sighting in `Pending`.
    pub fn receive(
        gateway_name: impl Into<String>,
        provider_event_id: impl Into<String>,
        event_type: WebhookEventType,
        payload: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: WebhookEventId::new(),
            gateway_name: gateway_name.into(),
            provider_event_id: provider_event_id.into(),
            event_type,
            payload: payload.into(),
            status: WebhookStatus::Pending,
            processed_at: None,
            error_message: None,
            signature: None,
            source_ip: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature.filter(|s| !s.is_empty());
        self
    }

    pub fn with_source_ip(mut self, source_ip: Option<String>) -> Self {
        self.source_ip = source_ip.filter(|s| !s.is_empty());
        self
    }

    pub fn is_processed(&self) -> bool {
        self.status == WebhookStatus::Processed
    }

    /// Pending and failed events may be claimed for dispatch (again).
    pub fn is_dispatchable(&self) -> bool {
        matches!(self.status, WebhookStatus::Pending | WebhookStatus::Failed)
    }

    /// Claims the event for one dispatch attempt: `Processing`, one more
    /// attempt, previous error cleared. The claim only holds once the
    /// repository accepted it; see `WebhookEventRepository::claim`.
    pub fn begin_attempt(&mut self) -> Result<(), DomainError> {
        if !self.is_dispatchable() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("webhook event in {} state cannot be dispatched", self.status),
            ));
        }
        self.transition(WebhookStatus::Processing)?;
        self.attempts += 1;
        self.error_message = None;
        Ok(())
    }

    pub fn mark_processed(&mut self) -> Result<(), DomainError> {
        self.transition(WebhookStatus::Processed)?;
        self.processed_at = Some(self.updated_at);
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), DomainError> {
        self.transition(WebhookStatus::Failed)?;
        self.error_message = Some(error.into());
        Ok(())
    }

    pub fn mark_ignored(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(WebhookStatus::Ignored)?;
        self.error_message = Some(reason.into());
        self.processed_at = Some(self.updated_at);
        Ok(())
    }

    fn transition(&mut self, target: WebhookStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|e| {
            DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                .with_detail("webhook_event_id", self.id.to_string())
        })?;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = self.updated_at.not_before(Timestamp::now());
    }
}
