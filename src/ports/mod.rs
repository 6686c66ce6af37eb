//! Ports - Interfaces for external dependencies.
//!
//! The domain and application layers depend only on these traits;
//! adapters implement them.
//!
//! ## Persistence
//!
//! - `PaymentRepository` - Versioned payment storage
//! - `PaymentTokenRepository` - Tokens with the single-default invariant
//! - `WebhookEventRepository` - Webhook audit log and idempotency record
//!
//! ## Read side
//!
//! - `PaymentCache` - Short-lived cache of `PaymentView` projections
//!
//! ## Providers
//!
//! - `PaymentGateway` - Uniform contract over external payment providers
//! - `GatewayResolver` - Lookup of configured gateways by name
//!
//! ## Events
//!
//! - `EventPublisher` / `EventSubscriber` / `EventHandler`

mod event_publisher;
mod payment_cache;
mod payment_gateway;
mod payment_repository;
mod payment_token_repository;
mod webhook_event_repository;

pub use event_publisher::{EventBus, EventHandler, EventPublisher, EventSubscriber};
pub use payment_cache::{PaymentCache, PaymentCacheKey, PaymentView, DEFAULT_PAYMENT_CACHE_TTL};
pub use payment_gateway::{
    Address, BankAccountDetails, CardDetails, GatewayError, GatewayResolver,
    GatewayTransactionStatus, PaymentGateway, PaymentInstrument, PaymentRequest, PaymentResponse, WalletDetails,
};
pub use payment_repository::{payment_conflict, payment_not_found, PaymentRepository};
pub use payment_token_repository::{token_conflict, token_inactive, token_not_found, PaymentTokenRepository};
pub use webhook_event_repository::{SaveResult, WebhookEventRepository};
