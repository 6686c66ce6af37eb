//! HTTP adapter for webhook endpoints.
//!
//! - `POST /webhooks/:gateway` - Provider callbacks (one path per provider)
//! - `POST /api/webhooks/:id/retry` - Re-dispatch a stored event

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{canonical_gateway_name, WebhookAppState};
pub use routes::webhook_routes;
