//! Tenant delivery statistics.

use entrega::{config::DeliveryMode, zones::DeliveryKind};
use serde::Serialize;

use crate::{context::AppContext, resolver::ResolveError, tenants::TenantId};

/// Roll-up of one tenant's delivery setup, for operator dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    /// Active resolution mode.
    pub mode: DeliveryMode,
    /// Registered zones, active or not.
    pub total_zones: usize,
    /// Active zones that actually deliver.
    pub deliverable_zones: usize,
    /// Bands in the radius ladder.
    pub total_bands: usize,
    /// Whether a center point has been resolved.
    pub center_resolved: bool,
    /// Cached geocoded addresses, fresh or expired.
    pub cached_addresses: usize,
}

impl AppContext {
    /// Collect the tenant's delivery configuration statistics.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when one of the backing stores fails.
    pub async fn delivery_stats(&self, tenant: TenantId) -> Result<DeliveryStats, ResolveError> {
        let config = self.configs.config(tenant).await?;
        let zones = self.zones.list_zones(tenant).await?;
        let bands = self.bands.list_bands(tenant).await?;
        let center = self.bands.center(tenant).await?;
        let cache = self.cache.stats(tenant);

        Ok(DeliveryStats {
            mode: config.mode,
            total_zones: zones.len(),
            deliverable_zones: zones
                .iter()
                .filter(|zone| zone.active && zone.kind != DeliveryKind::Unavailable)
                .count(),
            total_bands: bands.len(),
            center_resolved: center.is_some(),
            cached_addresses: cache.total,
        })
    }
}
