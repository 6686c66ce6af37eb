//! PaymentToken aggregate: a vaulted, gateway-tokenized instrument.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    CustomerId, DomainError, PaymentTokenId, Timestamp, ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    CreditCard,
    DebitCard,
    BankAccount,
    DigitalWallet,
}

impl TokenType {
    pub const ALL: [TokenType; 4] = [
        TokenType::CreditCard,
        TokenType::DebitCard,
        TokenType::BankAccount,
        TokenType::DigitalWallet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::CreditCard => "CREDIT_CARD",
            TokenType::DebitCard => "DEBIT_CARD",
            TokenType::BankAccount => "BANK_ACCOUNT",
            TokenType::DigitalWallet => "DIGITAL_WALLET",
        }
    }

    pub fn is_card(&self) -> bool {
        matches!(self, TokenType::CreditCard | TokenType::DebitCard)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::invalid_format("token_type", format!("unknown token type '{}'", s)))
    }
}

/// Display-only card details. Never contains a full card number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    pub last4_digits: Option<String>,
    pub card_brand: Option<String>,
    pub expiry_month: Option<u32>,
    pub expiry_year: Option<i32>,
}

impl CardMetadata {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(last4) = &self.last4_digits {
            if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError::invalid_format(
                    "last4_digits",
                    "must be exactly four digits",
                ));
            }
        }
        if let Some(month) = self.expiry_month {
            if !(1..=12).contains(&month) {
                return Err(ValidationError::out_of_range("expiry_month", 1, 12, month as i64));
            }
        }
        if let Some(year) = self.expiry_year {
            if !(1000..=9999).contains(&year) {
                return Err(ValidationError::out_of_range("expiry_year", 1000, 9999, year as i64));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentToken {
    pub id: PaymentTokenId,
    pub customer_id: CustomerId,
    pub token_type: TokenType,
    /// Opaque provider token.
    pub token: String,
    pub gateway_name: String,
    pub card: CardMetadata,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub version: i64,
}

impl PaymentToken {
    /// Vaults a new active token.
    pub fn create(
        customer_id: CustomerId,
        token: impl Into<String>,
        gateway_name: impl Into<String>,
        token_type: TokenType,
        card: Option<CardMetadata>,
        is_default: bool,
    ) -> Result<Self, DomainError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ValidationError::empty_field("token").into());
        }
        let gateway_name = gateway_name.into();
        if gateway_name.trim().is_empty() {
            return Err(ValidationError::empty_field("gateway_name").into());
        }
        let card = card.unwrap_or_default();
        card.validate()?;

        let now = Timestamp::now();
        Ok(Self {
            id: PaymentTokenId::new(),
            customer_id,
            token_type,
            token,
            gateway_name,
            card,
            is_default,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    pub fn belongs_to(&self, customer_id: CustomerId) -> bool {
        self.customer_id == customer_id
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// A card is valid through the last second of its expiry month.
    ///
    /// Returns false when either expiry field is unset.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        let (Some(month), Some(year)) = (self.card.expiry_month, self.card.expiry_year) else {
            return false;
        };
        let (next_year, next_month) = if month >= 12 { (year + 1, 1) } else { (year, month + 1) };
        match Timestamp::start_of_month(next_year, next_month) {
            Some(expires_at) => !now.is_before(&expires_at),
            None => false,
        }
    }

    pub fn set_default(&mut self) {
        self.is_default = true;
        self.touch();
    }

    pub fn clear_default(&mut self) {
        self.is_default = false;
        self.touch();
    }

    /// Deactivates the token. An inactive token is never the default.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.is_default = false;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = self.updated_at.not_before(Timestamp::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn card(month: Option<u32>, year: Option<i32>) -> CardMetadata {
        CardMetadata {
            last4_digits: Some("4242".to_string()),
            card_brand: Some("visa".to_string()),
            expiry_month: month,
            expiry_year: year,
        }
    }

    fn token_with(card_meta: CardMetadata) -> PaymentToken {
        PaymentToken::create(
            CustomerId::new(5).unwrap(),
            "tok_abc",
            "Stripe",
            TokenType::CreditCard,
            Some(card_meta),
            false,
        )
        .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap())
    }

    #[test]
    fn create_starts_active() {
        let token = token_with(card(Some(12), Some(2030)));
        assert!(token.is_active);
        assert!(!token.is_default);
        assert_eq!(token.version, 1);
    }

    #[test]
    fn create_rejects_empty_token() {
        let err = PaymentToken::create(
            CustomerId::new(5).unwrap(),
            " ",
            "Stripe",
            TokenType::CreditCard,
            None,
            false,
        )
        .unwrap_err();
        assert_eq!(err.detail("field"), Some("token"));
    }

    #[test]
    fn create_rejects_invalid_card_metadata() {
        assert!(card(Some(13), Some(2030)).validate().is_err());
        assert!(card(Some(0), Some(2030)).validate().is_err());
        assert!(card(Some(1), Some(30)).validate().is_err());

        let mut bad_last4 = card(Some(1), Some(2030));
        bad_last4.last4_digits = Some("42a2".to_string());
        assert!(bad_last4.validate().is_err());
    }

    #[test]
    fn card_valid_through_last_second_of_month() {
        let token = token_with(card(Some(6), Some(2030)));

        assert!(!token.is_expired_at(at(2030, 6, 30, 23, 59, 59)));
        assert!(token.is_expired_at(at(2030, 7, 1, 0, 0, 0)));
    }

    #[test]
    fn december_expiry_rolls_into_next_year() {
        let token = token_with(card(Some(12), Some(2030)));

        assert!(!token.is_expired_at(at(2030, 12, 31, 23, 59, 59)));
        assert!(token.is_expired_at(at(2031, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn future_expiry_is_not_expired() {
        let token = token_with(card(Some(1), Some(9999)));
        assert!(!token.is_expired());
    }

    #[test]
    fn unset_expiry_never_expires() {
        assert!(!token_with(card(None, None)).is_expired());
        assert!(!token_with(card(Some(1), None)).is_expired_at(at(2100, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn deactivate_clears_default() {
        let mut token = token_with(card(None, None));
        token.set_default();

        token.deactivate();

        assert!(!token.is_active);
        assert!(!token.is_default);
    }

    #[test]
    fn token_type_parses() {
        assert_eq!("digital_wallet".parse::<TokenType>().unwrap(), TokenType::DigitalWallet);
        assert!(TokenType::DebitCard.is_card());
        assert!(!TokenType::BankAccount.is_card());
    }
}
