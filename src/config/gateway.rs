//! Gateway configuration
//!
//! One entry per configured payment provider. Loaded at startup and never
//! mutated afterwards.

use secrecy::SecretString;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Registry name, matched case-sensitively
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Lower is preferred
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub environment: GatewayEnvironment,

    #[serde(default)]
    pub kind: GatewayKind,

    pub api_key: Option<SecretString>,

    /// Enables signature verification on webhook ingress when set
    pub webhook_secret: Option<SecretString>,

    #[serde(default)]
    pub settings: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    #[default]
    Sandbox,
    Production,
}

/// Which strategy backs the gateway.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    #[default]
    Mock,
}

impl GatewayConfig {
    /// An enabled sandbox mock gateway without secrets.
    pub fn mock(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            priority: 0,
            environment: GatewayEnvironment::Sandbox,
            kind: GatewayKind::Mock,
            api_key: None,
            webhook_secret: None,
            settings: HashMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(SecretString::new(secret.into()));
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyGatewayName);
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

/// Validates a full gateway list: names set and unique, one enabled.
pub fn validate_gateways(gateways: &[GatewayConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for gateway in gateways {
        gateway.validate()?;
        if !seen.insert(gateway.name.as_str()) {
            return Err(ValidationError::DuplicateGateway(gateway.name.clone()));
        }
    }
    if !gateways.iter().any(|g| g.enabled) {
        return Err(ValidationError::NoEnabledGateway);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "name": "Stripe",
            "webhook_secret": "whsec_test",
            "settings": { "merchant": "acme" }
        }))
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.kind, GatewayKind::Mock);
        assert_eq!(config.environment, GatewayEnvironment::Sandbox);
        assert!(config.webhook_secret.is_some());
        assert_eq!(config.settings.get("merchant").map(String::as_str), Some("acme"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result: Result<GatewayConfig, _> = serde_json::from_value(serde_json::json!({
            "name": "Stripe",
            "kind": "stripe"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let list = vec![GatewayConfig::mock("Mock"), GatewayConfig::mock("Mock")];
        assert_eq!(
            validate_gateways(&list),
            Err(ValidationError::DuplicateGateway("Mock".to_string()))
        );
    }

    #[test]
    fn needs_an_enabled_gateway() {
        let mut only = GatewayConfig::mock("Mock");
        only.enabled = false;
        assert_eq!(validate_gateways(&[only]), Err(ValidationError::NoEnabledGateway));
    }

    #[test]
    fn debug_hides_secrets() {
        let config = GatewayConfig::mock("Stripe").with_webhook_secret("whsec_very_secret");
        assert!(!format!("{:?}", config).contains("whsec_very_secret"));
    }
}
