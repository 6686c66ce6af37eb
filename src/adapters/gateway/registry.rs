//! Gateway registry.
//!
//! Built once by `GatewayRegistryBuilder` and immutable afterwards, so it can
//! be shared behind an `Arc` without locking. Gateways are ordered by
//! priority (lower first); registration order breaks ties.

use std::collections::HashMap;
use std::sync::Arc;

use super::MockGateway;
use crate::config::{GatewayConfig, GatewayKind};
use crate::ports::{GatewayError, GatewayResolver, PaymentGateway, PaymentRequest, PaymentResponse};

#[derive(Default)]
pub struct GatewayRegistryBuilder {
    entries: Vec<(i32, Arc<dyn PaymentGateway>)>,
}

impl GatewayRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, gateway: Arc<dyn PaymentGateway>, priority: i32) -> Self {
        self.entries.push((priority, gateway));
        self
    }

    /// Sorts by priority. A duplicate name keeps the first registration.
    pub fn build(self) -> GatewayRegistry {
        let mut entries = self.entries;
        // stable: equal priorities keep registration order
        entries.sort_by_key(|(priority, _)| *priority);

        let mut gateways: Vec<Arc<dyn PaymentGateway>> = Vec::with_capacity(entries.len());
        let mut by_name = HashMap::new();
        for (priority, gateway) in entries {
            let name = gateway.name().to_string();
            if by_name.contains_key(&name) {
                tracing::warn!(gateway = %name, priority, "duplicate gateway registration ignored");
                continue;
            }
            by_name.insert(name, gateways.len());
            gateways.push(gateway);
        }

        GatewayRegistry { gateways, by_name }
    }
}

pub struct GatewayRegistry {
    gateways: Vec<Arc<dyn PaymentGateway>>,
    by_name: HashMap<String, usize>,
}

impl GatewayRegistry {
    pub fn builder() -> GatewayRegistryBuilder {
        GatewayRegistryBuilder::new()
    }

    /// Builds strategies for every enabled configuration.
    pub fn from_configs(configs: &[GatewayConfig]) -> Self {
        configs
            .iter()
            .filter(|config| config.enabled)
            .fold(Self::builder(), |builder, config| {
                let gateway: Arc<dyn PaymentGateway> = match config.kind {
                    GatewayKind::Mock => Arc::new(MockGateway::new(config.name.clone())),
                };
                tracing::info!(
                    gateway = %config.name,
                    priority = config.priority,
                    environment = ?config.environment,
                    "registered payment gateway"
                );
                builder.register(gateway, config.priority)
            })
            .build()
    }

    /// Names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.gateways.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    /// Runs a sale through the named gateway.
    pub async fn process_payment(
        &self,
        gateway_name: &str,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, GatewayError> {
        let gateway = self.resolve(gateway_name)?;
        tracing::debug!(gateway = %gateway_name, amount = %request.amount, "processing payment");
        gateway.sale(request).await
    }
}

impl GatewayResolver for GatewayRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        self.by_name
            .get(name)
            .and_then(|&index| self.gateways.get(index))
            .cloned()
            .ok_or_else(|| GatewayError::UnknownGateway(name.to_string()))
    }

    /// Highest-priority gateway.
    fn primary(&self) -> Option<Arc<dyn PaymentGateway>> {
        self.gateways.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::CurrencyCode;
    use crate::domain::payment::PaymentMethod;
    use crate::ports::PaymentInstrument;
    use rust_decimal_macros::dec;

    fn mock(name: &str) -> Arc<dyn PaymentGateway> {
        Arc::new(MockGateway::new(name))
    }

    #[test]
    fn orders_by_priority_then_registration() {
        let registry = GatewayRegistry::builder()
            .register(mock("B"), 5)
            .register(mock("A"), 1)
            .register(mock("C"), 5)
            .build();

        assert_eq!(registry.names(), vec!["A", "B", "C"]);
        assert_eq!(registry.primary().unwrap().name(), "A");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = GatewayRegistry::builder().register(mock("Stripe"), 0).build();

        assert!(registry.resolve("Stripe").is_ok());
        assert_eq!(
            registry.resolve("stripe").err(),
            Some(GatewayError::UnknownGateway("stripe".to_string()))
        );
    }

    #[test]
    fn duplicate_names_keep_the_first() {
        let registry = GatewayRegistry::builder()
            .register(mock("Mock"), 2)
            .register(mock("Mock"), 1)
            .build();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_configs_skips_disabled() {
        let mut disabled = GatewayConfig::mock("PayPal");
        disabled.enabled = false;
        let configs = vec![
            GatewayConfig::mock("Stripe").with_priority(2),
            disabled,
            GatewayConfig::mock("AuthorizeNet").with_priority(1),
        ];

        let registry = GatewayRegistry::from_configs(&configs);

        assert_eq!(registry.names(), vec!["AuthorizeNet", "Stripe"]);
    }

    #[test]
    fn empty_registry_has_no_primary() {
        let registry = GatewayRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.primary().is_none());
    }

    #[tokio::test]
    async fn process_payment_runs_a_sale() {
        let registry = GatewayRegistry::builder().register(mock("Mock"), 0).build();
        let request = PaymentRequest::new(
            dec!(12.34),
            CurrencyCode::new("EUR").unwrap(),
            PaymentMethod::CreditCard,
            PaymentInstrument::Token("tok".to_string()),
        );

        let response = registry.process_payment("Mock", &request).await.unwrap();
        assert!(response.is_approved());

        let err = registry.process_payment("Nope", &request).await.unwrap_err();
        assert_eq!(err, GatewayError::UnknownGateway("Nope".to_string()));
    }
}
