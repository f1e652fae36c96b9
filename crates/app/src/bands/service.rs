//! Bands service.

use std::sync::Arc;

use async_trait::async_trait;
use entrega::bands::{RadiusBand, RadiusLadder};
use mockall::automock;
use tracing::info;
use uuid::Uuid;

use crate::{
    bands::{
        errors::BandsServiceError,
        models::{BandUpdate, CenterPoint, NewBand},
        repository::InMemoryBandsRepository,
    },
    geocode::Geocoder,
    tenants::TenantId,
};

/// In-memory [`BandsService`] backend.
///
/// Owns the geocoder handle so center addresses can be resolved at write
/// time; a ladder without resolvable center coordinates is unusable.
pub struct InMemoryBandsService {
    repository: InMemoryBandsRepository,
    geocoder: Arc<dyn Geocoder>,
}

impl InMemoryBandsService {
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            repository: InMemoryBandsRepository::new(),
            geocoder,
        }
    }

    fn build_band(band: NewBand) -> RadiusBand {
        RadiusBand {
            uuid: Uuid::now_v7(),
            km_start: band.km_start,
            km_end: band.km_end,
            fee: band.fee,
            eta_minutes: band.eta_minutes,
            active: true,
        }
    }
}

impl std::fmt::Debug for InMemoryBandsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBandsService").finish_non_exhaustive()
    }
}

#[async_trait]
impl BandsService for InMemoryBandsService {
    #[tracing::instrument(
        skip(self, band),
        fields(tenant = %tenant, km_start = band.km_start, km_end = band.km_end)
    )]
    async fn add_band(
        &self,
        tenant: TenantId,
        band: NewBand,
    ) -> Result<RadiusBand, BandsServiceError> {
        let band = Self::build_band(band);

        self.repository
            .write(tenant, |state| state.ladder.insert(band.clone()))?;

        info!(band_uuid = %band.uuid, "registered band");

        Ok(band)
    }

    async fn add_bands(
        &self,
        tenant: TenantId,
        bands: Vec<NewBand>,
    ) -> Result<Vec<RadiusBand>, BandsServiceError> {
        let mut created = Vec::with_capacity(bands.len());

        // Unlike zone imports, a conflicting band aborts the batch: silently
        // skipping an overlapping tier would change fees for its distances.
        for band in bands {
            created.push(self.add_band(tenant, band).await?);
        }

        Ok(created)
    }

    #[tracing::instrument(skip(self, update), fields(tenant = %tenant, band_uuid = %uuid))]
    async fn update_band(
        &self,
        tenant: TenantId,
        uuid: Uuid,
        update: BandUpdate,
    ) -> Result<RadiusBand, BandsServiceError> {
        self.repository.write(tenant, |state| {
            let mut band = state
                .ladder
                .get(uuid)
                .cloned()
                .ok_or(BandsServiceError::NotFound)?;

            if let Some(km_start) = update.km_start {
                band.km_start = km_start;
            }
            if let Some(km_end) = update.km_end {
                band.km_end = km_end;
            }
            if let Some(fee) = update.fee {
                band.fee = fee;
            }
            if let Some(eta_minutes) = update.eta_minutes {
                band.eta_minutes = eta_minutes;
            }
            if let Some(active) = update.active {
                band.active = active;
            }

            state.ladder.replace(band.clone())?;

            Ok(band)
        })
    }

    #[tracing::instrument(skip(self), fields(tenant = %tenant, band_uuid = %uuid))]
    async fn remove_band(&self, tenant: TenantId, uuid: Uuid) -> Result<(), BandsServiceError> {
        self.repository
            .write(tenant, |state| state.ladder.remove(uuid))
            .map(drop)
            .ok_or(BandsServiceError::NotFound)
    }

    async fn list_bands(&self, tenant: TenantId) -> Result<Vec<RadiusBand>, BandsServiceError> {
        Ok(self
            .repository
            .read(tenant, |state| state.ladder.iter().cloned().collect()))
    }

    async fn ladder(&self, tenant: TenantId) -> Result<RadiusLadder, BandsServiceError> {
        Ok(self.repository.read(tenant, |state| state.ladder.clone()))
    }

    #[tracing::instrument(skip(self, address), fields(tenant = %tenant))]
    async fn set_center(
        &self,
        tenant: TenantId,
        address: &str,
    ) -> Result<CenterPoint, BandsServiceError> {
        let coordinates = self
            .geocoder
            .geocode(address)
            .await
            .map_err(BandsServiceError::CenterUnresolvable)?;

        let center = CenterPoint {
            address: address.to_string(),
            coordinates,
        };

        self.repository
            .write(tenant, |state| state.center = Some(center.clone()));

        info!(lat = coordinates.lat, lng = coordinates.lng, "resolved center point");

        Ok(center)
    }

    async fn set_center_resolved(
        &self,
        tenant: TenantId,
        center: CenterPoint,
    ) -> Result<(), BandsServiceError> {
        self.repository
            .write(tenant, |state| state.center = Some(center));

        Ok(())
    }

    async fn center(&self, tenant: TenantId) -> Result<Option<CenterPoint>, BandsServiceError> {
        Ok(self.repository.read(tenant, |state| state.center.clone()))
    }
}

/// Radius ladder and center point operations.
#[automock]
#[async_trait]
pub trait BandsService: Send + Sync {
    /// Adds a distance band to the tenant's ladder.
    async fn add_band(
        &self,
        tenant: TenantId,
        band: NewBand,
    ) -> Result<RadiusBand, BandsServiceError>;

    /// Adds several bands at once; the first invalid band aborts the batch.
    async fn add_bands(
        &self,
        tenant: TenantId,
        bands: Vec<NewBand>,
    ) -> Result<Vec<RadiusBand>, BandsServiceError>;

    /// Applies an update to an existing band.
    async fn update_band(
        &self,
        tenant: TenantId,
        uuid: Uuid,
        update: BandUpdate,
    ) -> Result<RadiusBand, BandsServiceError>;

    /// Removes a band.
    async fn remove_band(&self, tenant: TenantId, uuid: Uuid) -> Result<(), BandsServiceError>;

    /// All bands for the tenant, sorted by lower bound.
    async fn list_bands(&self, tenant: TenantId) -> Result<Vec<RadiusBand>, BandsServiceError>;

    /// Snapshot of the tenant's ladder.
    async fn ladder(&self, tenant: TenantId) -> Result<RadiusLadder, BandsServiceError>;

    /// Geocode `address` and store it as the tenant's center point.
    async fn set_center(
        &self,
        tenant: TenantId,
        address: &str,
    ) -> Result<CenterPoint, BandsServiceError>;

    /// Store a center point whose coordinates were already resolved.
    async fn set_center_resolved(
        &self,
        tenant: TenantId,
        center: CenterPoint,
    ) -> Result<(), BandsServiceError>;

    /// The tenant's center point, when one has been resolved.
    async fn center(&self, tenant: TenantId) -> Result<Option<CenterPoint>, BandsServiceError>;
}

#[cfg(test)]
mod tests {
    use entrega::{bands::LadderError, geo::Coordinates};
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::geocode::{GeocodeError, MockGeocoder};

    use super::*;

    fn service_with(geocoder: MockGeocoder) -> InMemoryBandsService {
        InMemoryBandsService::new(Arc::new(geocoder))
    }

    fn new_band(km_start: f64, km_end: f64, fee: i64) -> NewBand {
        NewBand {
            km_start,
            km_end,
            fee: Decimal::from(fee),
            eta_minutes: 45,
        }
    }

    #[tokio::test]
    async fn add_bands_builds_an_ordered_ladder() -> TestResult {
        let service = service_with(MockGeocoder::new());
        let tenant = TenantId::random();

        service
            .add_bands(
                tenant,
                vec![new_band(5.0, 15.0, 20), new_band(0.0, 5.0, 10)],
            )
            .await?;

        let starts: Vec<f64> = service
            .list_bands(tenant)
            .await?
            .iter()
            .map(|b| b.km_start)
            .collect();

        assert_eq!(starts, vec![0.0, 5.0]);

        Ok(())
    }

    #[tokio::test]
    async fn overlapping_batch_aborts_with_earlier_bands_kept() -> TestResult {
        let service = service_with(MockGeocoder::new());
        let tenant = TenantId::random();

        let result = service
            .add_bands(
                tenant,
                vec![new_band(0.0, 10.0, 10), new_band(8.0, 12.0, 20)],
            )
            .await;

        assert!(
            matches!(
                result,
                Err(BandsServiceError::InvalidBand(LadderError::Overlap { .. }))
            ),
            "expected Overlap, got {result:?}"
        );
        assert_eq!(service.list_bands(tenant).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn update_that_would_overlap_leaves_the_ladder_unchanged() -> TestResult {
        let service = service_with(MockGeocoder::new());
        let tenant = TenantId::random();

        let first = service.add_band(tenant, new_band(0.0, 5.0, 10)).await?;
        service.add_band(tenant, new_band(5.0, 10.0, 20)).await?;

        let result = service
            .update_band(
                tenant,
                first.uuid,
                BandUpdate {
                    km_end: Some(7.0),
                    ..BandUpdate::default()
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(BandsServiceError::InvalidBand(LadderError::Overlap { .. }))
            ),
            "expected Overlap, got {result:?}"
        );

        let ladder = service.ladder(tenant).await?;
        let current = ladder.get(first.uuid).expect("band missing");

        assert_eq!(current.km_end, 5.0);

        Ok(())
    }

    #[tokio::test]
    async fn set_center_stores_the_geocoded_coordinates() -> TestResult {
        let mut geocoder = MockGeocoder::new();
        geocoder
            .expect_geocode()
            .times(1)
            .returning(|_| Ok(Coordinates::new(-23.5505, -46.6333)));

        let service = service_with(geocoder);
        let tenant = TenantId::random();

        service.set_center(tenant, "Av Central, 100").await?;

        let center = service.center(tenant).await?.expect("center missing");

        assert_eq!(center.address, "Av Central, 100");
        assert!((center.coordinates.lat + 23.5505).abs() < 1e-9);

        Ok(())
    }

    #[tokio::test]
    async fn unresolvable_center_is_a_loud_failure() -> TestResult {
        let mut geocoder = MockGeocoder::new();
        geocoder
            .expect_geocode()
            .times(1)
            .returning(|_| Err(GeocodeError::NotFound));

        let service = service_with(geocoder);
        let tenant = TenantId::random();

        let result = service.set_center(tenant, "nowhere at all").await;

        assert!(
            matches!(result, Err(BandsServiceError::CenterUnresolvable(_))),
            "expected CenterUnresolvable, got {result:?}"
        );
        assert!(service.center(tenant).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn remove_band_unknown_uuid_returns_not_found() {
        let service = service_with(MockGeocoder::new());

        let result = service.remove_band(TenantId::random(), Uuid::now_v7()).await;

        assert!(
            matches!(result, Err(BandsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
