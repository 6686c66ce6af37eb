//! Payment handlers.
//!
//! ## Commands
//! - Create, authorize, capture, complete, fail, refund and cancel payments
//! - Process a payment through a gateway under a deadline
//! - Reconcile a payment against the gateway's record
//!
//! ## Queries
//! - Get a payment by id or by provider transaction id (cache-aside)
//! - List the payments of an order
//!
//! Every command writes through `PaymentWriter`.

mod authorize_payment;
mod cancel_payment;
mod capture_payment;
mod complete_payment;
mod create_payment;
mod fail_payment;
mod get_payment;
mod list_order_payments;
mod process_payment;
mod reconcile_payment;
mod refund_payment;
mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use writer::PaymentWriter;

// Commands
pub use authorize_payment::{AuthorizePaymentCommand, AuthorizePaymentHandler};
pub use cancel_payment::{CancelPaymentCommand, CancelPaymentHandler};
pub use capture_payment::{CapturePaymentCommand, CapturePaymentHandler};
pub use complete_payment::{CompletePaymentCommand, CompletePaymentHandler};
pub use create_payment::{CreatePaymentCommand, CreatePaymentHandler};
pub use fail_payment::{FailPaymentCommand, FailPaymentHandler};
pub use process_payment::{ProcessPaymentCommand, ProcessPaymentHandler};
pub use reconcile_payment::{ReconcilePaymentCommand, ReconcilePaymentHandler};
pub use refund_payment::{RefundPaymentCommand, RefundPaymentHandler};

// Queries
pub use get_payment::{
    GetPaymentByTransactionHandler, GetPaymentByTransactionQuery, GetPaymentHandler,
    GetPaymentQuery,
};
pub use list_order_payments::{ListOrderPaymentsHandler, ListOrderPaymentsQuery};
