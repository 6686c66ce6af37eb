//! Webhook ingestion domain.
//!
//! - `event` - WebhookEvent entity
//! - `event_type` - normalized event classification
//! - `status` - processing status state machine
//! - `processor` - idempotent ingestion pipeline and dispatch traits
//! - `verifier` - HMAC signature verification
//! - `errors` - WebhookError

mod errors;
mod event;
mod event_type;
mod processor;
mod status;
mod verifier;

pub use errors::WebhookError;
pub use event::WebhookEvent;
pub use event_type::WebhookEventType;
pub use processor::{
    IncomingWebhook, RetrySummary, WebhookDispatcher, WebhookEventHandler, WebhookHandlerRegistry,
    WebhookProcessor,
};
pub use status::WebhookStatus;
pub use verifier::{sign_payload, SignatureHeader, WebhookSignatureVerifier};
