//! Normalized webhook event classification.
//!
//! Providers name the same business fact differently; everything is mapped
//! onto one closed set so handlers never see provider vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookEventType {
    PaymentSucceeded,
    PaymentFailed,
    PaymentRefunded,
    PaymentCancelled,
    ChargebackCreated,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionCancelled,
    DisputeCreated,
    Unknown,
}

impl WebhookEventType {
    pub const ALL: [WebhookEventType; 10] = [
        WebhookEventType::PaymentSucceeded,
        WebhookEventType::PaymentFailed,
        WebhookEventType::PaymentRefunded,
        WebhookEventType::PaymentCancelled,
        WebhookEventType::ChargebackCreated,
        WebhookEventType::SubscriptionCreated,
        WebhookEventType::SubscriptionUpdated,
        WebhookEventType::SubscriptionCancelled,
        WebhookEventType::DisputeCreated,
        WebhookEventType::Unknown,
    ];

    /// Classifies a provider event name. Unrecognized names map to `Unknown`.
    pub fn from_provider(name: &str) -> Self {
        let name = name.trim();
        if let Ok(canonical) = name.parse::<WebhookEventType>() {
            return canonical;
        }
        match name.to_ascii_lowercase().as_str() {
            // canonical dotted names
            "payment.succeeded" | "payment.completed" => WebhookEventType::PaymentSucceeded,
            "payment.failed" => WebhookEventType::PaymentFailed,
            "payment.refunded" => WebhookEventType::PaymentRefunded,
            "payment.cancelled" | "payment.canceled" => WebhookEventType::PaymentCancelled,
            "chargeback.created" => WebhookEventType::ChargebackCreated,
            "subscription.created" => WebhookEventType::SubscriptionCreated,
            "subscription.updated" => WebhookEventType::SubscriptionUpdated,
            "subscription.cancelled" | "subscription.canceled" => {
                WebhookEventType::SubscriptionCancelled
            }
            "dispute.created" => WebhookEventType::DisputeCreated,

            // Stripe
            "payment_intent.succeeded" | "charge.succeeded" => WebhookEventType::PaymentSucceeded,
            "payment_intent.payment_failed" | "charge.failed" => WebhookEventType::PaymentFailed,
            "charge.refunded" => WebhookEventType::PaymentRefunded,
            "payment_intent.canceled" => WebhookEventType::PaymentCancelled,
            "charge.dispute.created" => WebhookEventType::ChargebackCreated,
            "customer.subscription.created" => WebhookEventType::SubscriptionCreated,
            "customer.subscription.updated" => WebhookEventType::SubscriptionUpdated,
            "customer.subscription.deleted" => WebhookEventType::SubscriptionCancelled,

            // PayPal
            "payment.capture.completed" | "payment.sale.completed" => {
                WebhookEventType::PaymentSucceeded
            }
            "payment.capture.denied" | "payment.capture.declined" => {
                WebhookEventType::PaymentFailed
            }
            "payment.capture.refunded" | "payment.sale.refunded" => {
                WebhookEventType::PaymentRefunded
            }
            "payment.authorization.voided" => WebhookEventType::PaymentCancelled,
            "customer.dispute.created" => WebhookEventType::DisputeCreated,
            "billing.subscription.created" => WebhookEventType::SubscriptionCreated,
            "billing.subscription.updated" => WebhookEventType::SubscriptionUpdated,
            "billing.subscription.cancelled" => WebhookEventType::SubscriptionCancelled,

            // Authorize.Net
            "net.authorize.payment.authcapture.created"
            | "net.authorize.payment.capture.created" => WebhookEventType::PaymentSucceeded,
            "net.authorize.payment.refund.created" => WebhookEventType::PaymentRefunded,
            "net.authorize.payment.void.created" => WebhookEventType::PaymentCancelled,
            "net.authorize.payment.fraud.declined" => WebhookEventType::PaymentFailed,
            "net.authorize.customer.subscription.created" => WebhookEventType::SubscriptionCreated,
            "net.authorize.customer.subscription.updated" => WebhookEventType::SubscriptionUpdated,
            "net.authorize.customer.subscription.cancelled" => {
                WebhookEventType::SubscriptionCancelled
            }

            _ => WebhookEventType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventType::PaymentSucceeded => "PAYMENT_SUCCEEDED",
            WebhookEventType::PaymentFailed => "PAYMENT_FAILED",
            WebhookEventType::PaymentRefunded => "PAYMENT_REFUNDED",
            WebhookEventType::PaymentCancelled => "PAYMENT_CANCELLED",
            WebhookEventType::ChargebackCreated => "CHARGEBACK_CREATED",
            WebhookEventType::SubscriptionCreated => "SUBSCRIPTION_CREATED",
            WebhookEventType::SubscriptionUpdated => "SUBSCRIPTION_UPDATED",
            WebhookEventType::SubscriptionCancelled => "SUBSCRIPTION_CANCELLED",
            WebhookEventType::DisputeCreated => "DISPUTE_CREATED",
            WebhookEventType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the canonical upper-case names only; see `from_provider` for the rest.
impl FromStr for WebhookEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookEventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown webhook event type '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripe_names_are_normalized() {
        assert_eq!(
            WebhookEventType::from_provider("payment_intent.succeeded"),
            WebhookEventType::PaymentSucceeded
        );
        assert_eq!(
            WebhookEventType::from_provider("charge.refunded"),
            WebhookEventType::PaymentRefunded
        );
        assert_eq!(
            WebhookEventType::from_provider("charge.dispute.created"),
            WebhookEventType::ChargebackCreated
        );
    }

    #[test]
    fn paypal_names_are_normalized_case_insensitively() {
        assert_eq!(
            WebhookEventType::from_provider("PAYMENT.CAPTURE.COMPLETED"),
            WebhookEventType::PaymentSucceeded
        );
        assert_eq!(
            WebhookEventType::from_provider("PAYMENT.CAPTURE.DENIED"),
            WebhookEventType::PaymentFailed
        );
    }

    #[test]
    fn authorize_net_names_are_normalized() {
        assert_eq!(
            WebhookEventType::from_provider("net.authorize.payment.void.created"),
            WebhookEventType::PaymentCancelled
        );
    }

    #[test]
    fn canonical_names_round_trip() {
        for event_type in WebhookEventType::ALL {
            assert_eq!(WebhookEventType::from_provider(event_type.as_str()), event_type);
        }
    }

    #[test]
    fn unrecognized_names_are_unknown() {
        assert_eq!(WebhookEventType::from_provider("invoice.paid"), WebhookEventType::Unknown);
        assert_eq!(WebhookEventType::from_provider(""), WebhookEventType::Unknown);
    }
}
