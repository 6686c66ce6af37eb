//! Application handlers.
//!
//! - `payment` - payment lifecycle commands, gateway orchestration, queries
//! - `webhook` - per-event-type handlers that apply provider notifications
//! - `token` - customer token vault

pub mod payment;
pub mod token;
pub mod webhook;
