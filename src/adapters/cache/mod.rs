//! Payment view cache adapters.
//!
//! - `InMemoryPaymentCache` - process-local map with per-entry expiry
//! - `RedisPaymentCache` - JSON values with `SET EX`, shared across instances

mod in_memory;
mod redis;

pub use in_memory::InMemoryPaymentCache;
pub use self::redis::RedisPaymentCache;
