//! Application layer - Commands, Queries, and Handlers.
//!
//! Orchestrates the domain through the ports. Command handlers change
//! state and publish events; query handlers read projections.

pub mod handlers;
