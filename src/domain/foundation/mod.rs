//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types and event plumbing
//! that form the vocabulary of the payment domain.

mod command;
mod errors;
mod events;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{CustomerId, OrderId, PaymentId, PaymentTokenId, WebhookEventId};
pub use money::{ensure_positive, CurrencyCode};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
