//! Redis configuration (payment view cache)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,

    /// Prefix prepended to every cache key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connect timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS__URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        Ok(())
    }
}

fn default_key_prefix() -> String {
    "payment-core".to_string()
}

fn default_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> RedisConfig {
        RedisConfig {
            url: url.to_string(),
            key_prefix: default_key_prefix(),
            timeout_secs: default_timeout(),
        }
    }

    #[test]
    fn accepts_tls_scheme() {
        assert!(config("rediss://cache.internal:6380").validate().is_ok());
    }

    #[test]
    fn rejects_http_url() {
        assert_eq!(
            config("http://localhost:6379").validate(),
            Err(ValidationError::InvalidRedisUrl)
        );
    }
}
