//! payment-core - payment processing backend
//!
//! Payment lifecycle state machine, a provider-agnostic gateway layer,
//! idempotent webhook ingestion and a customer token vault, laid out as
//! ports and adapters:
//!
//! - `domain` - aggregates, state machines, domain errors and events
//! - `ports` - traits the application depends on
//! - `application` - command and query handlers
//! - `adapters` - PostgreSQL, Redis, in-memory, gateway and HTTP implementations
//! - `config` - layered configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
