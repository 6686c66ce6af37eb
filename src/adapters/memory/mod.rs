//! In-memory repository adapters.
//!
//! Same contracts as the PostgreSQL adapters, held behind a single
//! `tokio::sync::RwLock` per store. Used by tests and local runs without a
//! database.

mod payment_repository;
mod token_repository;
mod webhook_event_repository;

pub use payment_repository::InMemoryPaymentRepository;
pub use token_repository::InMemoryPaymentTokenRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
