//! Zones service.

use async_trait::async_trait;
use entrega::zones::{Zone, ZoneError};
use mockall::automock;
use tracing::info;
use uuid::Uuid;

use crate::{
    tenants::TenantId,
    zones::{
        errors::ZonesServiceError,
        models::{NewZone, ZoneUpdate},
        repository::InMemoryZonesRepository,
    },
};

/// In-memory [`ZonesService`] backend.
#[derive(Debug, Default)]
pub struct InMemoryZonesService {
    repository: InMemoryZonesRepository,
}

impl InMemoryZonesService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository: InMemoryZonesRepository::new(),
        }
    }

    fn build_zone(zone: NewZone) -> Zone {
        Zone {
            uuid: Uuid::now_v7(),
            name: zone.name,
            city: zone.city,
            state: zone.state,
            kind: zone.kind,
            fee: zone.fee,
            eta_minutes: zone.eta_minutes,
            active: true,
        }
    }
}

#[async_trait]
impl ZonesService for InMemoryZonesService {
    #[tracing::instrument(skip(self, zone), fields(tenant = %tenant, zone_name = %zone.name))]
    async fn add_zone(&self, tenant: TenantId, zone: NewZone) -> Result<Zone, ZonesServiceError> {
        let zone = Self::build_zone(zone);

        self.repository.write(tenant, |set| set.insert(zone.clone()))?;

        info!(zone_uuid = %zone.uuid, "registered zone");

        Ok(zone)
    }

    async fn add_zones(
        &self,
        tenant: TenantId,
        zones: Vec<NewZone>,
    ) -> Result<Vec<Zone>, ZonesServiceError> {
        let mut created = Vec::with_capacity(zones.len());

        for zone in zones {
            match self.add_zone(tenant, zone).await {
                Ok(zone) => created.push(zone),
                // Bulk imports skip names that are already registered.
                Err(ZonesServiceError::InvalidZone(ZoneError::DuplicateName(_))) => continue,
                Err(error) => return Err(error),
            }
        }

        Ok(created)
    }

    #[tracing::instrument(skip(self, update), fields(tenant = %tenant, zone_uuid = %uuid))]
    async fn update_zone(
        &self,
        tenant: TenantId,
        uuid: Uuid,
        update: ZoneUpdate,
    ) -> Result<Zone, ZonesServiceError> {
        self.repository.write(tenant, |set| {
            let mut zone = set.get(uuid).cloned().ok_or(ZonesServiceError::NotFound)?;

            if let Some(name) = update.name {
                zone.name = name;
            }
            if let Some(kind) = update.kind {
                zone.kind = kind;
            }
            if let Some(fee) = update.fee {
                zone.fee = fee;
            }
            if let Some(eta_minutes) = update.eta_minutes {
                zone.eta_minutes = eta_minutes;
            }
            if let Some(active) = update.active {
                zone.active = active;
            }

            set.replace(zone.clone())?;

            Ok(zone)
        })
    }

    #[tracing::instrument(skip(self), fields(tenant = %tenant, zone_uuid = %uuid))]
    async fn remove_zone(&self, tenant: TenantId, uuid: Uuid) -> Result<(), ZonesServiceError> {
        self.repository
            .write(tenant, |set| set.remove(uuid))
            .map(drop)
            .ok_or(ZonesServiceError::NotFound)
    }

    async fn list_zones(&self, tenant: TenantId) -> Result<Vec<Zone>, ZonesServiceError> {
        Ok(self
            .repository
            .read(tenant, |set| set.iter().cloned().collect()))
    }

    async fn find_by_name(
        &self,
        tenant: TenantId,
        name: &str,
    ) -> Result<Option<Zone>, ZonesServiceError> {
        Ok(self
            .repository
            .read(tenant, |set| set.find_by_name(name).cloned()))
    }
}

/// Zone registry operations.
#[automock]
#[async_trait]
pub trait ZonesService: Send + Sync {
    /// Registers a new zone for the tenant.
    async fn add_zone(&self, tenant: TenantId, zone: NewZone) -> Result<Zone, ZonesServiceError>;

    /// Registers several zones at once. Zones whose names are already taken
    /// are skipped rather than failing the whole batch.
    async fn add_zones(
        &self,
        tenant: TenantId,
        zones: Vec<NewZone>,
    ) -> Result<Vec<Zone>, ZonesServiceError>;

    /// Applies an update to an existing zone.
    async fn update_zone(
        &self,
        tenant: TenantId,
        uuid: Uuid,
        update: ZoneUpdate,
    ) -> Result<Zone, ZonesServiceError>;

    /// Removes a zone.
    async fn remove_zone(&self, tenant: TenantId, uuid: Uuid) -> Result<(), ZonesServiceError>;

    /// All zones registered for the tenant, active or not.
    async fn list_zones(&self, tenant: TenantId) -> Result<Vec<Zone>, ZonesServiceError>;

    /// The active zone matching `name`, compared on normalized form.
    /// `Ok(None)` means the name is not registered, which is an expected outcome.
    async fn find_by_name(
        &self,
        tenant: TenantId,
        name: &str,
    ) -> Result<Option<Zone>, ZonesServiceError>;
}
