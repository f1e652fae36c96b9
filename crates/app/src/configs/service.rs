//! Delivery configuration service.

use async_trait::async_trait;
use entrega::config::{DeliveryConfig, DeliveryMode};
use mockall::automock;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::{configs::errors::ConfigsServiceError, tenants::TenantId};

/// In-memory [`DeliveryConfigsService`] backend.
#[derive(Debug, Default)]
pub struct InMemoryDeliveryConfigsService {
    configs: RwLock<FxHashMap<TenantId, DeliveryConfig>>,
}

impl InMemoryDeliveryConfigsService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryConfigsService for InMemoryDeliveryConfigsService {
    async fn config(&self, tenant: TenantId) -> Result<DeliveryConfig, ConfigsServiceError> {
        Ok(self
            .configs
            .read()
            .get(&tenant)
            .cloned()
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self), fields(tenant = %tenant))]
    async fn set_mode(
        &self,
        tenant: TenantId,
        mode: DeliveryMode,
    ) -> Result<DeliveryConfig, ConfigsServiceError> {
        let mut configs = self.configs.write();
        let config = configs.entry(tenant).or_default();
        config.mode = mode;

        info!(?mode, "switched delivery mode");

        Ok(config.clone())
    }

    #[tracing::instrument(skip(self, minimum), fields(tenant = %tenant))]
    async fn set_free_delivery_minimum(
        &self,
        tenant: TenantId,
        minimum: Option<Decimal>,
    ) -> Result<DeliveryConfig, ConfigsServiceError> {
        if minimum.is_some_and(|m| m < Decimal::ZERO) {
            return Err(ConfigsServiceError::NegativeMinimum);
        }

        let mut configs = self.configs.write();
        let config = configs.entry(tenant).or_default();
        config.free_delivery_minimum = minimum;

        Ok(config.clone())
    }
}

/// Per-tenant delivery configuration operations.
///
/// The mode only ever changes through [`DeliveryConfigsService::set_mode`];
/// nothing infers it from traffic.
#[automock]
#[async_trait]
pub trait DeliveryConfigsService: Send + Sync {
    /// The tenant's configuration; defaults apply when never set.
    async fn config(&self, tenant: TenantId) -> Result<DeliveryConfig, ConfigsServiceError>;

    /// Switch the tenant's resolution mode.
    async fn set_mode(
        &self,
        tenant: TenantId,
        mode: DeliveryMode,
    ) -> Result<DeliveryConfig, ConfigsServiceError>;

    /// Set or clear the subtotal threshold for free delivery.
    async fn set_free_delivery_minimum(
        &self,
        tenant: TenantId,
        minimum: Option<Decimal>,
    ) -> Result<DeliveryConfig, ConfigsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn unset_tenants_get_the_default_configuration() -> TestResult {
        let service = InMemoryDeliveryConfigsService::new();

        let config = service.config(TenantId::random()).await?;

        assert_eq!(config.mode, DeliveryMode::Neighborhood);
        assert!(config.free_delivery_minimum.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn set_mode_persists_per_tenant() -> TestResult {
        let service = InMemoryDeliveryConfigsService::new();
        let tenant = TenantId::random();

        service.set_mode(tenant, DeliveryMode::Hybrid).await?;

        assert_eq!(service.config(tenant).await?.mode, DeliveryMode::Hybrid);
        assert_eq!(
            service.config(TenantId::random()).await?.mode,
            DeliveryMode::Neighborhood
        );

        Ok(())
    }

    #[tokio::test]
    async fn negative_minimum_is_rejected() -> TestResult {
        let service = InMemoryDeliveryConfigsService::new();
        let tenant = TenantId::random();

        let result = service
            .set_free_delivery_minimum(tenant, Some(Decimal::from(-10)))
            .await;

        assert_eq!(result, Err(ConfigsServiceError::NegativeMinimum));
        assert!(service.config(tenant).await?.free_delivery_minimum.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn minimum_can_be_cleared() -> TestResult {
        let service = InMemoryDeliveryConfigsService::new();
        let tenant = TenantId::random();

        service
            .set_free_delivery_minimum(tenant, Some(Decimal::from(100)))
            .await?;
        service.set_free_delivery_minimum(tenant, None).await?;

        assert!(service.config(tenant).await?.free_delivery_minimum.is_none());

        Ok(())
    }
}
