//! Webhook event processing status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookStatus {
    /// Stored, not yet claimed for dispatch.
    Pending,
    /// Claimed by one dispatcher; nobody else may run its handler.
    Processing,
    Processed,
    /// A handler failed; eligible for retry.
    Failed,
    /// No handler cares about this event type.
    Ignored,
}

impl WebhookStatus {
    pub const ALL: [WebhookStatus; 5] = [
        WebhookStatus::Pending,
        WebhookStatus::Processing,
        WebhookStatus::Processed,
        WebhookStatus::Failed,
        WebhookStatus::Ignored,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStatus::Pending => "PENDING",
            WebhookStatus::Processing => "PROCESSING",
            WebhookStatus::Processed => "PROCESSED",
            WebhookStatus::Failed => "FAILED",
            WebhookStatus::Ignored => "IGNORED",
        }
    }
}

impl StateMachine for WebhookStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use WebhookStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Failed, Processing)
                | (Processing, Processed)
                | (Processing, Failed)
                | (Processing, Ignored)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        WebhookStatus::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(target))
            .collect()
    }
}

impl fmt::Display for WebhookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::invalid_format("status", format!("unknown webhook status '{}'", s)))
    }
}
