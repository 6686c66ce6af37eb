//! Request DTOs for payment endpoints. Responses are `PaymentView`.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::payment::PaymentMethod;
use crate::ports::{Address, BankAccountDetails, CardDetails, PaymentInstrument, WalletDetails};

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: i64,
    pub customer_id: i64,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizePaymentRequest {
    pub authorization_code: String,
    pub transaction_id: String,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Body of capture and complete; both fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettlePaymentRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailPaymentRequest {
    pub reason: String,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundPaymentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelPaymentRequest {
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessPaymentRequest {
    /// Registry name; the primary gateway when omitted.
    #[serde(default)]
    pub gateway: Option<String>,
    pub instrument: InstrumentRequest,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl ProcessPaymentRequest {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcilePaymentRequest {
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// Instrument as posted by the caller. Numbers are wrapped in
/// `SecretString` as soon as they leave the DTO.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstrumentRequest {
    Card {
        number: String,
        expiry_month: u32,
        expiry_year: i32,
        #[serde(default)]
        cvv: Option<String>,
        #[serde(default)]
        holder_name: Option<String>,
    },
    BankAccount {
        account_number: String,
        routing_number: String,
        #[serde(default)]
        holder_name: Option<String>,
    },
    Wallet {
        provider: String,
        wallet_token: String,
    },
    Token {
        token: String,
    },
}

impl std::fmt::Debug for InstrumentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            InstrumentRequest::Card { .. } => "card",
            InstrumentRequest::BankAccount { .. } => "bank_account",
            InstrumentRequest::Wallet { .. } => "wallet",
            InstrumentRequest::Token { .. } => "token",
        };
        f.debug_struct("InstrumentRequest").field("type", &kind).finish_non_exhaustive()
    }
}

impl From<InstrumentRequest> for PaymentInstrument {
    fn from(request: InstrumentRequest) -> Self {
        match request {
            InstrumentRequest::Card {
                number,
                expiry_month,
                expiry_year,
                cvv,
                holder_name,
            } => PaymentInstrument::Card(CardDetails {
                number: SecretString::new(number),
                expiry_month,
                expiry_year,
                cvv: cvv.map(SecretString::new),
                holder_name,
            }),
            InstrumentRequest::BankAccount {
                account_number,
                routing_number,
                holder_name,
            } => PaymentInstrument::BankAccount(BankAccountDetails {
                account_number: SecretString::new(account_number),
                routing_number,
                holder_name,
            }),
            InstrumentRequest::Wallet { provider, wallet_token } => {
                PaymentInstrument::Wallet(WalletDetails { provider, wallet_token })
            }
            InstrumentRequest::Token { token } => PaymentInstrument::Token(token),
        }
    }
}
