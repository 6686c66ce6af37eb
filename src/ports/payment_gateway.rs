//! PaymentGateway port - uniform contract over external payment providers.
//!
//! Orchestration code only ever talks to this trait. Provider-specific
//! fields stay inside the adapter; everything crossing the boundary is
//! normalized into `PaymentRequest` / `PaymentResponse`.
//!
//! Calls are not retried here. A failure is surfaced immediately and the
//! caller decides what to do with it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::{CurrencyCode, CustomerId, OrderId, Timestamp};
use crate::domain::payment::{PaymentError, PaymentMethod};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Configured provider name, e.g. "Stripe".
    fn name(&self) -> &str;

    /// Reserves funds without collecting them.
    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentResponse, GatewayError>;

    /// Collects previously authorized funds.
    async fn capture(&self, transaction_id: &str, amount: Decimal) -> Result<PaymentResponse, GatewayError>;

    /// Authorize and capture in one step.
    async fn sale(&self, request: &PaymentRequest) -> Result<PaymentResponse, GatewayError>;

    async fn refund(&self, transaction_id: &str, amount: Decimal) -> Result<PaymentResponse, GatewayError>;

    /// Releases an authorization that was never captured.
    async fn void(&self, transaction_id: &str) -> Result<PaymentResponse, GatewayError>;

    /// Reconciliation lookup by transaction id or request reference.
    async fn get_transaction(&self, transaction_id: &str) -> Result<PaymentResponse, GatewayError>;
}

/// Name-based access to the configured gateways.
pub trait GatewayResolver: Send + Sync {
    /// Exact, case-sensitive lookup.
    fn resolve(&self, name: &str) -> Result<Arc<dyn PaymentGateway>, GatewayError>;

    /// Gateway used when a command names none.
    fn primary(&self) -> Option<Arc<dyn PaymentGateway>>;

    /// The named gateway, or the primary when `name` is `None`.
    fn resolve_or_primary(&self, name: Option<&str>) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        match name {
            Some(name) => self.resolve(name),
            None => self
                .primary()
                .ok_or_else(|| GatewayError::UnknownGateway("<primary>".to_string())),
        }
    }
}

/// Instrument details. Sensitive numbers stay wrapped in `SecretString`.
#[derive(Debug, Clone)]
pub enum PaymentInstrument {
    Card(CardDetails),
    BankAccount(BankAccountDetails),
    Wallet(WalletDetails),
    /// Previously vaulted provider token.
    Token(String),
}

#[derive(Debug, Clone)]
pub struct CardDetails {
    pub number: SecretString,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: Option<SecretString>,
    pub holder_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BankAccountDetails {
    pub account_number: SecretString,
    pub routing_number: String,
    pub holder_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WalletDetails {
    pub provider: String,
    pub wallet_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub payment_method: PaymentMethod,
    pub instrument: PaymentInstrument,
    pub billing_address: Option<Address>,
    pub customer_id: Option<CustomerId>,
    pub order_id: Option<OrderId>,
    pub description: Option<String>,
    /// Caller reference (the payment id), usable with `get_transaction`.
    pub reference: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl PaymentRequest {
    pub fn new(
        amount: Decimal,
        currency: CurrencyCode,
        payment_method: PaymentMethod,
        instrument: PaymentInstrument,
    ) -> Self {
        Self {
            amount,
            currency,
            payment_method,
            instrument,
            billing_address: None,
            customer_id: None,
            order_id: None,
            description: None,
            reference: None,
            metadata: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayTransactionStatus {
    /// Authorized or captured, depending on the call.
    Approved,
    Declined,
    /// Provider accepted the request but has not settled it.
    Pending,
    Voided,
    Refunded,
    Error,
}

/// Normalized provider answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub transaction_id: String,
    pub status: GatewayTransactionStatus,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub auth_code: Option<String>,
    pub avs_result: Option<String>,
    pub cvv_result: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub processed_at: Timestamp,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentResponse {
    pub fn is_approved(&self) -> bool {
        self.status == GatewayTransactionStatus::Approved
    }

    /// Provider message for a non-approved answer.
    pub fn failure_message(&self) -> String {
        self.error_message
            .clone()
            .or_else(|| self.error_code.clone())
            .unwrap_or_else(|| format!("transaction {:?}", self.status).to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("declined: {message}")]
    Declined { code: Option<String>, message: String },

    #[error("gateway {gateway} timed out after {after_ms}ms")]
    Timeout { gateway: String, after_ms: u64 },

    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("no gateway registered under '{0}'")]
    UnknownGateway(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Timeout { .. } | GatewayError::Unavailable(_))
    }

    /// Converts into the payment taxonomy, naming the gateway involved.
    pub fn into_payment_error(self, gateway: &str) -> PaymentError {
        match self {
            GatewayError::Timeout { .. } => PaymentError::GatewayTimeout {
                gateway: gateway.to_string(),
            },
            GatewayError::UnknownGateway(name) => {
                PaymentError::validation("gateway", format!("no gateway registered under '{}'", name))
            }
            GatewayError::Declined { message, .. } => PaymentError::gateway(gateway, message),
            other => PaymentError::gateway(gateway, other.to_string()),
        }
    }
}
