//! Domain layer containing business logic and domain types.
//!
//! - `foundation` - Shared primitives (ids, money, errors, events, state machine)
//! - `payment` - Payment aggregate and lifecycle
//! - `webhook` - Provider webhook ingestion
//! - `token` - Payment token vault

pub mod foundation;
pub mod payment;
pub mod token;
pub mod webhook;
