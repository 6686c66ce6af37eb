//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

macro_rules! uuid_identifier {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a payment attempt.
    PaymentId
);

uuid_identifier!(
    /// Unique identifier for an observed provider webhook.
    WebhookEventId
);

uuid_identifier!(
    /// Unique identifier for a vaulted payment token.
    PaymentTokenId
);

macro_rules! numeric_reference {
    ($(#[$doc:meta])* $name:ident, $field:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates a reference, rejecting zero and negative values.
            pub fn new(value: i64) -> Result<Self, ValidationError> {
                if value <= 0 {
                    return Err(ValidationError::not_positive($field, value));
                }
                Ok(Self(value))
            }

            /// Returns the raw value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| ValidationError::invalid_format($field, e.to_string()))?;
                Self::new(value)
            }
        }
    };
}

numeric_reference!(
    /// Reference to an order owned by the order service.
    OrderId,
    "order_id"
);

numeric_reference!(
    /// Reference to a customer owned by the customer service.
    CustomerId,
    "customer_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_id_generates_unique_values() {
        assert_ne!(PaymentId::new(), PaymentId::new());
    }

    #[test]
    fn payment_id_parses_from_display() {
        let id = PaymentId::new();
        let parsed: PaymentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn payment_id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&PaymentId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }

    #[test]
    fn order_id_rejects_non_positive_values() {
        assert!(OrderId::new(0).is_err());
        assert!(OrderId::new(-4).is_err());
        assert_eq!(OrderId::new(1).unwrap().as_i64(), 1);
    }

    #[test]
    fn customer_id_parses_from_string() {
        let id: CustomerId = " 9 ".parse().unwrap();
        assert_eq!(id.as_i64(), 9);
        assert!("abc".parse::<CustomerId>().is_err());
    }
}
