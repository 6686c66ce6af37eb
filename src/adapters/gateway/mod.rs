//! Payment gateway adapters.
//!
//! - `GatewayRegistry` - immutable name → strategy map, built once at startup
//! - `MockGateway` - deterministic in-memory strategy

mod mock;
mod registry;

pub use mock::{GatewayCall, MockGateway};
pub use registry::{GatewayRegistry, GatewayRegistryBuilder};
