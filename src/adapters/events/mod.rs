//! Event publishing adapters.
//!
//! - `InMemoryEventBus` - synchronous in-process bus with subscribers
//! - `QueuedEventPublisher` - bounded non-blocking front for any publisher

mod in_memory;
mod queued_publisher;

pub use in_memory::InMemoryEventBus;
pub use queued_publisher::{EventQueueWorker, QueuedEventPublisher};
