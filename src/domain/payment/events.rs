//! Payment domain events.
//!
//! Published after a state change is persisted. Every event carries the
//! payment and order ids plus the fields of the transition it records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Payment, PaymentMethod};
use crate::domain::foundation::{
    domain_event, CurrencyCode, CustomerId, EventId, OrderId, PaymentId, Timestamp,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreated {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency_code: CurrencyCode,
    pub created_at: Timestamp,
}

domain_event!(
    PaymentCreated,
    event_type = "payment.created",
    schema_version = 1,
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = created_at,
    event_id = event_id
);

impl PaymentCreated {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            order_id: payment.order_id,
            customer_id: payment.customer_id,
            payment_method: payment.payment_method,
            amount: payment.amount,
            currency_code: payment.currency_code.clone(),
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAuthorized {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub authorization_code: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: Decimal,
    pub authorized_at: Timestamp,
}

domain_event!(
    PaymentAuthorized,
    event_type = "payment.authorized",
    schema_version = 1,
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = authorized_at,
    event_id = event_id
);

impl PaymentAuthorized {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            order_id: payment.order_id,
            authorization_code: payment.authorization_code.clone(),
            transaction_id: payment.transaction_id.clone(),
            amount: payment.amount,
            authorized_at: payment.authorized_at.unwrap_or(payment.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCaptured {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub transaction_id: Option<String>,
    pub amount: Decimal,
    pub captured_at: Timestamp,
}

domain_event!(
    PaymentCaptured,
    event_type = "payment.captured",
    schema_version = 1,
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = captured_at,
    event_id = event_id
);

impl PaymentCaptured {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            order_id: payment.order_id,
            transaction_id: payment.transaction_id.clone(),
            amount: payment.amount,
            captured_at: payment.captured_at.unwrap_or(payment.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCompleted {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub transaction_id: Option<String>,
    pub amount: Decimal,
    pub currency_code: CurrencyCode,
    pub completed_at: Timestamp,
}

domain_event!(
    PaymentCompleted,
    event_type = "payment.completed",
    schema_version = 1,
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = completed_at,
    event_id = event_id
);

impl PaymentCompleted {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            order_id: payment.order_id,
            customer_id: payment.customer_id,
            transaction_id: payment.transaction_id.clone(),
            amount: payment.amount,
            currency_code: payment.currency_code.clone(),
            completed_at: payment.processed_at.unwrap_or(payment.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailed {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub reason: String,
    pub failed_at: Timestamp,
}

domain_event!(
    PaymentFailed,
    event_type = "payment.failed",
    schema_version = 1,
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = failed_at,
    event_id = event_id
);

impl PaymentFailed {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            order_id: payment.order_id,
            reason: payment.failure_reason.clone().unwrap_or_default(),
            failed_at: payment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRefunded {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    /// Amount returned by this refund.
    pub amount: Decimal,
    /// Cumulative refunded amount after this refund.
    pub total_refunded: Decimal,
    pub fully_refunded: bool,
    pub refunded_at: Timestamp,
}

domain_event!(
    PaymentRefunded,
    event_type = "payment.refunded",
    schema_version = 1,
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = refunded_at,
    event_id = event_id
);

impl PaymentRefunded {
    pub fn from_payment(payment: &Payment, amount: Decimal) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            order_id: payment.order_id,
            amount,
            total_refunded: payment.refund_amount,
            fully_refunded: payment.refund_amount == payment.amount,
            refunded_at: payment.refunded_at.unwrap_or(payment.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCancelled {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub cancelled_at: Timestamp,
}

domain_event!(
    PaymentCancelled,
    event_type = "payment.cancelled",
    schema_version = 1,
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = cancelled_at,
    event_id = event_id
);

impl PaymentCancelled {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            order_id: payment.order_id,
            cancelled_at: payment.updated_at,
        }
    }
}
