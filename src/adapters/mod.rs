//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - in-process repositories for tests and database-less runs
//! - `postgres` - sqlx repositories
//! - `cache` - payment view caches (in-memory, Redis)
//! - `gateway` - gateway registry and the mock provider
//! - `events` - in-process event bus and the queued publisher
//! - `http` - axum REST API and webhook ingress

pub mod cache;
pub mod events;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod postgres;

pub use events::{EventQueueWorker, InMemoryEventBus, QueuedEventPublisher};
