//! Finds the payment a provider webhook talks about.
//!
//! Providers nest references differently, so each field is looked up under
//! a list of JSON pointers, first match wins:
//!
//! | Field | Pointers |
//! |---|---|
//! | transaction id | `/transaction_id`, `/data/object/payment_intent`, `/data/object/id`, `/resource/id`, `/payload/id` |
//! | order id | `/order_id`, `/data/object/metadata/order_id`, `/resource/custom_id`, `/payload/invoiceNumber` |
//! | amount | `/amount`, `/resource/amount/value`, `/payload/authAmount` |
//! | reason | `/reason`, `/failure_message`, `/data/object/last_payment_error/message`, `/resource/status_details/reason`, `/payload/responseReasonDescription` |
//!
//! Amounts are read in major units; Stripe's integer minor units are not
//! consulted.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::application::handlers::payment::PaymentWriter;
use crate::domain::foundation::{CommandMetadata, OrderId};
use crate::domain::payment::Payment;
use crate::domain::webhook::{WebhookError, WebhookEvent};

const TRANSACTION_POINTERS: &[&str] = &[
    "/transaction_id",
    "/data/object/payment_intent",
    "/data/object/id",
    "/resource/id",
    "/payload/id",
];

const ORDER_POINTERS: &[&str] = &[
    "/order_id",
    "/data/object/metadata/order_id",
    "/resource/custom_id",
    "/payload/invoiceNumber",
];

const AMOUNT_POINTERS: &[&str] = &["/amount", "/resource/amount/value", "/payload/authAmount"];

const REASON_POINTERS: &[&str] = &[
    "/reason",
    "/failure_message",
    "/data/object/last_payment_error/message",
    "/resource/status_details/reason",
    "/payload/responseReasonDescription",
];

/// References extracted from a webhook body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookPayload {
    pub transaction_id: Option<String>,
    pub order_id: Option<OrderId>,
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
}

impl WebhookPayload {
    /// # Errors
    ///
    /// `ParseError` when the body is not JSON or carries a malformed amount.
    pub fn parse(raw: &str) -> Result<Self, WebhookError> {
        let body: Value =
            serde_json::from_str(raw).map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let amount = match first_text(&body, AMOUNT_POINTERS) {
            Some(text) => Some(
                Decimal::from_str(&text)
                    .map_err(|e| WebhookError::ParseError(format!("amount '{}': {}", text, e)))?,
            ),
            None => None,
        };

        Ok(Self {
            transaction_id: first_text(&body, TRANSACTION_POINTERS),
            order_id: first_text(&body, ORDER_POINTERS).and_then(|id| id.parse().ok()),
            amount,
            reason: first_text(&body, REASON_POINTERS),
        })
    }

    fn describe(&self) -> String {
        match (&self.transaction_id, &self.order_id) {
            (Some(txn), _) => txn.clone(),
            (None, Some(order)) => format!("order {}", order),
            (None, None) => "<no reference>".to_string(),
        }
    }
}

/// Strings and numbers both count; empty strings do not.
fn first_text(body: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|pointer| match body.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Shared lookup and write access for the payment webhook handlers.
#[derive(Clone)]
pub struct PaymentLocator {
    writer: PaymentWriter,
}

impl PaymentLocator {
    pub fn new(writer: PaymentWriter) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &PaymentWriter {
        &self.writer
    }

    /// Resolves by transaction id, then by order id (newest attempt).
    ///
    /// # Errors
    ///
    /// `PaymentNotFound` when neither reference matches. The error is
    /// retryable: the payment may simply not be written yet.
    pub async fn locate(&self, event: &WebhookEvent) -> Result<(Payment, WebhookPayload), WebhookError> {
        let payload = WebhookPayload::parse(&event.payload)?;

        if let Some(txn) = &payload.transaction_id {
            if let Some(payment) = self.writer.find_by_transaction_id(txn).await? {
                return Ok((payment, payload));
            }
        }
        if let Some(order_id) = payload.order_id {
            if let Some(payment) = self.writer.find_by_order_id(order_id).await?.into_iter().next() {
                return Ok((payment, payload));
            }
        }

        Err(WebhookError::PaymentNotFound(payload.describe()))
    }

    /// Metadata for writes caused by a webhook; the event id correlates them.
    pub fn metadata_for(event: &WebhookEvent) -> CommandMetadata {
        CommandMetadata::system("webhook")
            .with_correlation_id(event.id.to_string())
            .with_trace_id(format!("{}:{}", event.gateway_name, event.provider_event_id))
    }
}
