//! Response DTOs for webhook endpoints.

use serde::Serialize;

use crate::domain::foundation::{Timestamp, WebhookEventId};
use crate::domain::webhook::{WebhookEvent, WebhookEventType, WebhookStatus};

/// Acknowledgement returned to providers.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<WebhookEventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WebhookStatus>,
}

impl WebhookAck {
    pub fn stored(event: &WebhookEvent) -> Self {
        Self {
            received: true,
            event_id: Some(event.id),
            status: Some(event.status),
        }
    }

    /// The delivery was accepted but could not be recorded.
    pub fn unrecorded() -> Self {
        Self {
            received: true,
            event_id: None,
            status: None,
        }
    }
}

/// Stored event without its raw payload or signature.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEventView {
    pub id: WebhookEventId,
    pub gateway_name: String,
    pub provider_event_id: String,
    pub event_type: WebhookEventType,
    pub status: WebhookStatus,
    pub attempts: u32,
    pub error_message: Option<String>,
    pub processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&WebhookEvent> for WebhookEventView {
    fn from(event: &WebhookEvent) -> Self {
        Self {
            id: event.id,
            gateway_name: event.gateway_name.clone(),
            provider_event_id: event.provider_event_id.clone(),
            event_type: event.event_type,
            status: event.status,
            attempts: event.attempts,
            error_message: event.error_message.clone(),
            processed_at: event.processed_at,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}
