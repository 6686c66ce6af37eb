//! Read model for payment tokens.

use serde::Serialize;

use crate::domain::foundation::{CustomerId, PaymentTokenId, Timestamp};
use crate::domain::token::{PaymentToken, TokenType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub id: PaymentTokenId,
    pub customer_id: CustomerId,
    pub token_type: TokenType,
    pub token: String,
    pub gateway_name: String,
    pub last4_digits: Option<String>,
    pub card_brand: Option<String>,
    pub expiry_month: Option<u32>,
    pub expiry_year: Option<i32>,
    pub is_default: bool,
    pub is_active: bool,
    pub is_expired: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TokenView {
    pub fn at(token: &PaymentToken, now: Timestamp) -> Self {
        Self {
            id: token.id,
            customer_id: token.customer_id,
            token_type: token.token_type,
            token: token.token.clone(),
            gateway_name: token.gateway_name.clone(),
            last4_digits: token.card.last4_digits.clone(),
            card_brand: token.card.card_brand.clone(),
            expiry_month: token.card.expiry_month,
            expiry_year: token.card.expiry_year,
            is_default: token.is_default,
            is_active: token.is_active,
            is_expired: token.is_expired_at(now),
            created_at: token.created_at,
            updated_at: token.updated_at,
        }
    }
}

impl From<&PaymentToken> for TokenView {
    fn from(token: &PaymentToken) -> Self {
        Self::at(token, Timestamp::now())
    }
}
