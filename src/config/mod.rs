//! Application configuration
//!
//! Loaded with the `config` and `dotenvy` crates from, in increasing
//! precedence: an optional config file (`payment-core.{toml,yaml,json}` or the
//! path in `PAYMENT_CORE_CONFIG_FILE`), then environment variables prefixed
//! with `PAYMENT_CORE` using `__` between nested keys.
//!
//! - `PAYMENT_CORE__SERVER__PORT=8080` -> `server.port = 8080`
//! - `PAYMENT_CORE__DATABASE__URL=...` -> `database.url = ...`
//! - `PAYMENT_CORE__PAYMENTS__GATEWAY_DEADLINE_SECS=10`
//!
//! The gateway list is easiest to express in the config file. With no
//! gateway configured a single sandbox mock named `Mock` is used.

mod database;
mod error;
mod gateway;
mod payments;
mod redis;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::{validate_gateways, GatewayConfig, GatewayEnvironment, GatewayKind};
pub use payments::PaymentsConfig;
pub use redis::RedisConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

const ENV_PREFIX: &str = "PAYMENT_CORE";
const CONFIG_FILE_VAR: &str = "PAYMENT_CORE_CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "payment-core";
const DEFAULT_GATEWAY_NAME: &str = "Mock";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; in-memory repositories when absent
    pub database: Option<DatabaseConfig>,

    /// Redis view cache; in-memory cache when absent
    pub redis: Option<RedisConfig>,

    #[serde(default)]
    pub payments: PaymentsConfig,

    #[serde(default)]
    pub gateways: Vec<GatewayConfig>,
}

impl AppConfig {
    /// Loads `.env`, the optional config file, then the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadError` when a source cannot be read or a
    /// value has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config: AppConfig = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if config.gateways.is_empty() {
            config.gateways.push(GatewayConfig::mock(DEFAULT_GATEWAY_NAME));
        }
        Ok(config)
    }

    /// Loads and validates in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.payments.validate()?;
        validate_gateways(&self.gateways)?;
        Ok(())
    }

    /// Looks up a gateway configuration by registry name.
    pub fn gateway(&self, name: &str) -> Option<&GatewayConfig> {
        self.gateways.iter().find(|g| g.name == name)
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PAYMENT_CORE__SERVER__PORT",
        "PAYMENT_CORE__SERVER__ENVIRONMENT",
        "PAYMENT_CORE__DATABASE__URL",
        "PAYMENT_CORE__PAYMENTS__GATEWAY_DEADLINE_SECS",
        "PAYMENT_CORE__PAYMENTS__CACHE_TTL_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.database.is_none());
        assert!(config.redis.is_none());
        assert_eq!(config.payments.gateway_deadline_secs, 30);
        assert_eq!(config.gateways.len(), 1);
        assert_eq!(config.gateways[0].name, "Mock");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_nested_environment_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("PAYMENT_CORE__SERVER__PORT", "3000");
        env::set_var("PAYMENT_CORE__DATABASE__URL", "postgres://localhost/payments");
        env::set_var("PAYMENT_CORE__PAYMENTS__GATEWAY_DEADLINE_SECS", "5");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.database.is_some());
        assert_eq!(config.payments.gateway_deadline_secs, 5);
        assert_eq!(config.payments.cache_ttl_secs, 300);
    }

    #[test]
    fn production_environment_is_detected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("PAYMENT_CORE__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn finds_gateway_by_exact_name() {
        let config = AppConfig {
            gateways: vec![GatewayConfig::mock("Stripe")],
            ..Default::default()
        };
        assert!(config.gateway("Stripe").is_some());
        assert!(config.gateway("stripe").is_none());
    }
}
