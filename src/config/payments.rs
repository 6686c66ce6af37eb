//! Payment processing knobs

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    /// TTL of cached payment views, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Deadline for a single gateway call, in seconds
    #[serde(default = "default_gateway_deadline")]
    pub gateway_deadline_secs: u64,

    /// Capacity of the bounded domain event queue
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,

    /// Accepted clock skew for webhook signatures, in seconds
    #[serde(default = "default_signature_tolerance")]
    pub webhook_signature_tolerance_secs: i64,

    /// Processed and ignored webhook events older than this are purged
    #[serde(default = "default_retention_days")]
    pub webhook_retention_days: i64,

    /// Failed webhook retry sweep interval, in seconds; 0 disables the sweep
    #[serde(default = "default_retry_interval")]
    pub webhook_retry_interval_secs: u64,

    /// Events per retry sweep
    #[serde(default = "default_retry_batch")]
    pub webhook_retry_batch: usize,
}

impl PaymentsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn gateway_deadline(&self) -> Duration {
        Duration::from_secs(self.gateway_deadline_secs)
    }

    pub fn webhook_retry_interval(&self) -> Option<Duration> {
        (self.webhook_retry_interval_secs > 0)
            .then(|| Duration::from_secs(self.webhook_retry_interval_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.gateway_deadline_secs == 0 {
            return Err(ValidationError::MustBePositive("payments.gateway_deadline_secs"));
        }
        if self.event_queue_capacity == 0 {
            return Err(ValidationError::MustBePositive("payments.event_queue_capacity"));
        }
        if self.webhook_signature_tolerance_secs <= 0 {
            return Err(ValidationError::MustBePositive(
                "payments.webhook_signature_tolerance_secs",
            ));
        }
        if self.webhook_retention_days <= 0 {
            return Err(ValidationError::MustBePositive("payments.webhook_retention_days"));
        }
        if self.webhook_retry_batch == 0 {
            return Err(ValidationError::MustBePositive("payments.webhook_retry_batch"));
        }
        Ok(())
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            gateway_deadline_secs: default_gateway_deadline(),
            event_queue_capacity: default_event_queue_capacity(),
            webhook_signature_tolerance_secs: default_signature_tolerance(),
            webhook_retention_days: default_retention_days(),
            webhook_retry_interval_secs: default_retry_interval(),
            webhook_retry_batch: default_retry_batch(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_gateway_deadline() -> u64 {
    30
}

fn default_event_queue_capacity() -> usize {
    1024
}

fn default_signature_tolerance() -> i64 {
    300
}

fn default_retention_days() -> i64 {
    90
}

fn default_retry_interval() -> u64 {
    60
}

fn default_retry_batch() -> usize {
    50
}
