//! Webhook error types.
//!
//! Status codes here describe what the ingress endpoint would answer if it
//! surfaced the error. Processing failures are still acknowledged with 200 so
//! providers stop redelivering; recovery goes through the retry command.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, WebhookEventId};
use crate::domain::payment::PaymentError;

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature timestamp is outside the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The webhook references a payment this service does not know.
    #[error("Payment not found for reference: {0}")]
    PaymentNotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Acknowledged without processing; not a failure.
    #[error("Event ignored: {0}")]
    Ignored(String),

    #[error("Webhook event not found: {0}")]
    NotFound(WebhookEventId),

    /// A handler failed. The event row is stored as FAILED and can be retried.
    #[error("Webhook event {event_id} failed: {reason}")]
    ProcessingFailed {
        event_id: WebhookEventId,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// True when a later retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_)
                | WebhookError::PaymentNotFound(_)
                | WebhookError::ProcessingFailed { .. }
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,
            WebhookError::NotFound(_) => StatusCode::NOT_FOUND,
            WebhookError::Ignored(_) => StatusCode::OK,
            WebhookError::PaymentNotFound(_)
            | WebhookError::InvalidTransition(_)
            | WebhookError::ProcessingFailed { .. }
            | WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

impl From<PaymentError> for WebhookError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(id) => WebhookError::PaymentNotFound(id.to_string()),
            PaymentError::TransactionNotFound(txn) => WebhookError::PaymentNotFound(txn),
            PaymentError::ValidationFailed { message, .. } => WebhookError::InvalidTransition(message),
            other => WebhookError::Database(other.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PaymentId;

    #[test]
    fn ignored_is_acknowledged() {
        assert_eq!(WebhookError::Ignored("no handler".into()).status_code(), StatusCode::OK);
    }

    #[test]
    fn signature_failures_are_unauthorized() {
        assert_eq!(WebhookError::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(WebhookError::TimestampOutOfRange.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn payment_rule_violation_becomes_invalid_transition() {
        let err = WebhookError::from(PaymentError::validation("status", "payment is not refundable"));
        assert!(matches!(err, WebhookError::InvalidTransition(ref m) if m == "payment is not refundable"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_payment_is_retryable() {
        let err = WebhookError::from(PaymentError::not_found(PaymentId::new()));
        assert!(err.is_retryable());
    }

    #[test]
    fn processing_failed_displays_event_and_reason() {
        let id = WebhookEventId::new();
        let err = WebhookError::ProcessingFailed {
            event_id: id,
            reason: "db down".into(),
        };
        assert_eq!(err.to_string(), format!("Webhook event {} failed: db down", id));
    }
}
