//! HTTP adapter for payment endpoints.
//!
//! - `POST /api/payments` - Create a payment
//! - `GET /api/payments/:id` - Get a payment
//! - `GET /api/payments/by-transaction/:transaction_id` - Get by provider reference
//! - `GET /api/orders/:order_id/payments` - List an order's payments
//! - `POST /api/payments/:id/{authorize,capture,complete,fail,refund,cancel}` - Transitions
//! - `POST /api/payments/:id/process` - Charge through a gateway
//! - `POST /api/payments/:id/reconcile` - Apply the gateway's record

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::PaymentAppState;
pub use routes::payment_routes;
