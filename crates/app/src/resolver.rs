//! Delivery resolution across the three tenant modes.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
    time::Duration,
};

use entrega::{
    address::normalize,
    bands::LadderError,
    config::{DeliveryConfig, DeliveryMode},
    decision::{DeliveryDecision, MatchedVia},
};
use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    bands::{BandsService, BandsServiceError},
    cache::{AddressCache, CacheEntry},
    configs::{ConfigsServiceError, DeliveryConfigsService},
    geocode::Geocoder,
    tenants::TenantId,
    zones::{ZonesService, ZonesServiceError},
};

/// Default upper bound on a single geocode call.
pub const DEFAULT_GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures that indicate broken configuration or an upstream defect.
///
/// Ordinary "we don't deliver there" outcomes (unknown zone, out of
/// coverage, geocode failure or timeout) are `Ok` ineligible
/// [`DeliveryDecision`]s, never errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Radius resolution was requested but the tenant has no resolved
    /// center point.
    #[error("tenant has no resolved center point for radius delivery")]
    MissingCenter,

    /// Band selection rejected the computed distance.
    #[error("band selection failed")]
    Ladder(#[from] LadderError),

    /// Zone lookup failed.
    #[error("zone lookup failed")]
    Zones(#[from] ZonesServiceError),

    /// Band lookup failed.
    #[error("band lookup failed")]
    Bands(#[from] BandsServiceError),

    /// Configuration lookup failed.
    #[error("configuration lookup failed")]
    Configs(#[from] ConfigsServiceError),
}

/// Resolves delivery eligibility, fee, and ETA for customer addresses.
///
/// Every collaborator is injected at construction; the resolver holds no
/// tenant state of its own and can serve any number of tenants concurrently.
pub struct DeliveryResolver {
    zones: Arc<dyn ZonesService>,
    bands: Arc<dyn BandsService>,
    configs: Arc<dyn DeliveryConfigsService>,
    geocoder: Arc<dyn Geocoder>,
    cache: Arc<AddressCache>,
    geocode_timeout: Duration,
}

impl Debug for DeliveryResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DeliveryResolver")
            .field("geocode_timeout", &self.geocode_timeout)
            .finish_non_exhaustive()
    }
}

impl DeliveryResolver {
    /// Create a resolver with the default geocode timeout.
    #[must_use]
    pub fn new(
        zones: Arc<dyn ZonesService>,
        bands: Arc<dyn BandsService>,
        configs: Arc<dyn DeliveryConfigsService>,
        geocoder: Arc<dyn Geocoder>,
        cache: Arc<AddressCache>,
    ) -> Self {
        Self {
            zones,
            bands,
            configs,
            geocoder,
            cache,
            geocode_timeout: DEFAULT_GEOCODE_TIMEOUT,
        }
    }

    /// Override the per-call geocode timeout.
    #[must_use]
    pub fn with_geocode_timeout(mut self, timeout: Duration) -> Self {
        self.geocode_timeout = timeout;
        self
    }

    /// Resolve a delivery decision under an explicit configuration.
    ///
    /// # Errors
    ///
    /// Only defects: a missing center point in radius resolution, a broken
    /// distance computation, or a failing backing store. Expected
    /// non-eligibility comes back as an `Ok` ineligible decision.
    #[tracing::instrument(
        skip(self, config, address),
        fields(tenant = %tenant, mode = ?config.mode)
    )]
    pub async fn resolve(
        &self,
        tenant: TenantId,
        config: &DeliveryConfig,
        address: &str,
        order_subtotal: Decimal,
    ) -> Result<DeliveryDecision, ResolveError> {
        let decision = match config.mode {
            DeliveryMode::Neighborhood => self.resolve_neighborhood(tenant, address).await?,
            DeliveryMode::Radius => self.resolve_radius(tenant, address).await?,
            DeliveryMode::Hybrid => {
                let by_zone = self.resolve_neighborhood(tenant, address).await?;

                // A registered name settles the outcome either way: an
                // explicit "we don't serve that zone" must not quietly fall
                // through to a distance check. Only unregistered names do.
                if by_zone.matched_via == MatchedVia::Neighborhood {
                    by_zone
                } else {
                    self.resolve_radius(tenant, address).await?
                }
            }
        };

        let decision =
            decision.with_free_delivery_minimum(order_subtotal, config.free_delivery_minimum);

        info!(
            eligible = decision.eligible,
            matched_via = %decision.matched_via,
            "resolved delivery decision"
        );

        Ok(decision)
    }

    /// Resolve using the tenant's stored configuration.
    ///
    /// # Errors
    ///
    /// Same contract as [`DeliveryResolver::resolve`].
    pub async fn resolve_for_tenant(
        &self,
        tenant: TenantId,
        address: &str,
        order_subtotal: Decimal,
    ) -> Result<DeliveryDecision, ResolveError> {
        let config = self.configs.config(tenant).await?;

        self.resolve(tenant, &config, address, order_subtotal).await
    }

    async fn resolve_neighborhood(
        &self,
        tenant: TenantId,
        address: &str,
    ) -> Result<DeliveryDecision, ResolveError> {
        match self.zones.find_by_name(tenant, address).await? {
            Some(zone) => Ok(DeliveryDecision::from_zone(&zone)),
            None => Ok(DeliveryDecision::ineligible()),
        }
    }

    async fn resolve_radius(
        &self,
        tenant: TenantId,
        address: &str,
    ) -> Result<DeliveryDecision, ResolveError> {
        let Some(center) = self.bands.center(tenant).await? else {
            return Err(ResolveError::MissingCenter);
        };

        let ladder = self.bands.ladder(tenant).await?;
        let normalized = normalize(address);

        let cached = self.cache.get(tenant, &normalized);
        let freshly_geocoded = cached.is_none();

        let coordinates = match cached {
            Some(entry) => entry.coordinates,
            None => {
                let resolved = self
                    .cache
                    .coordinates_for(
                        tenant,
                        &normalized,
                        self.geocoder.as_ref(),
                        self.geocode_timeout,
                    )
                    .await;

                match resolved {
                    Some(coordinates) => coordinates,
                    None => {
                        // "Cannot validate" rather than "out of range"; the
                        // customer sees the same answer, operators should not.
                        debug!(tenant = %tenant, "address not geocodable, cannot validate delivery");
                        return Ok(DeliveryDecision::ineligible());
                    }
                }
            }
        };

        let distance_km = center.coordinates.distance_km(coordinates);

        let decision = match ladder.band_for(distance_km)? {
            Some(band) => DeliveryDecision::from_band(band),
            None => {
                debug!(tenant = %tenant, distance_km, "address outside delivery coverage");
                DeliveryDecision::ineligible()
            }
        };

        // Only a fresh geocode creates or refreshes an entry; rewriting on
        // cache hits would keep extending the TTL of old geo data.
        if freshly_geocoded {
            self.cache.put(
                tenant,
                normalized,
                CacheEntry {
                    coordinates,
                    decision: decision.clone(),
                    resolved_at: Timestamp::now(),
                },
            );
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use entrega::{geo::Coordinates, zones::DeliveryKind};
    use testresult::TestResult;

    use crate::{geocode::GeocodeError, test::TestContext};

    use super::*;

    const KM_PER_DEGREE_LAT: f64 = 111.19;

    fn coords_km_north_of(center: Coordinates, km: f64) -> Coordinates {
        Coordinates::new(center.lat + km / KM_PER_DEGREE_LAT, center.lng)
    }

    #[tokio::test]
    async fn neighborhood_mode_matches_a_registered_zone() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.seed_zone("Centro", DeliveryKind::Paid, 5, 30).await;

        let decision = ctx.resolve("Centro", 0).await?;

        assert!(decision.eligible);
        assert_eq!(decision.fee, Decimal::from(5));
        assert_eq!(decision.eta_minutes, Some(30));
        assert_eq!(decision.matched_via, MatchedVia::Neighborhood);

        Ok(())
    }

    #[tokio::test]
    async fn neighborhood_mode_unknown_name_is_not_eligible() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.seed_zone("Centro", DeliveryKind::Paid, 5, 30).await;

        let decision = ctx.resolve("Vila Madalena", 0).await?;

        assert!(!decision.eligible);
        assert_eq!(decision.matched_via, MatchedVia::NoMatch);

        Ok(())
    }

    #[tokio::test]
    async fn unavailable_zone_is_refused_with_the_zone_match_recorded() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.seed_zone("Centro", DeliveryKind::Unavailable, 0, 30).await;

        let decision = ctx.resolve("Centro", 0).await?;

        assert!(!decision.eligible);
        assert_eq!(decision.matched_via, MatchedVia::Neighborhood);

        Ok(())
    }

    #[tokio::test]
    async fn hybrid_mode_never_geocodes_an_unavailable_zone() -> TestResult {
        // A geocoder with no expectations panics if it is ever called.
        let ctx = TestContext::new().await;
        ctx.set_mode(DeliveryMode::Hybrid).await;
        ctx.seed_zone("Centro", DeliveryKind::Unavailable, 0, 30).await;
        ctx.seed_band(0.0, 50.0, 10, 45).await;
        ctx.set_center(Coordinates::new(-23.5505, -46.6333)).await;

        let decision = ctx.resolve("Centro", 0).await?;

        assert!(!decision.eligible);
        assert_ne!(decision.matched_via, MatchedVia::Radius);

        Ok(())
    }

    #[tokio::test]
    async fn hybrid_mode_falls_back_to_bands_for_unregistered_names() -> TestResult {
        let center = Coordinates::new(-23.5505, -46.6333);
        let destination = coords_km_north_of(center, 7.0);

        let ctx = TestContext::with_geocoder(move |mock| {
            mock.expect_geocode().times(1).returning(move |_| Ok(destination));
        })
        .await;
        ctx.set_mode(DeliveryMode::Hybrid).await;
        ctx.seed_zone("Centro", DeliveryKind::Paid, 5, 30).await;
        ctx.seed_band(0.0, 5.0, 10, 45).await;
        ctx.seed_band(5.0, 15.0, 20, 60).await;
        ctx.set_center(center).await;

        let decision = ctx.resolve("Rua Nova 123", 0).await?;

        assert!(decision.eligible);
        assert_eq!(decision.fee, Decimal::from(20));
        assert_eq!(decision.eta_minutes, Some(60));
        assert_eq!(decision.matched_via, MatchedVia::Radius);

        Ok(())
    }

    #[tokio::test]
    async fn radius_mode_geocode_failure_is_an_ineligible_decision() -> TestResult {
        let ctx = TestContext::with_geocoder(|mock| {
            mock.expect_geocode()
                .times(1)
                .returning(|_| Err(GeocodeError::NotFound));
        })
        .await;
        ctx.set_mode(DeliveryMode::Radius).await;
        ctx.seed_band(0.0, 10.0, 10, 45).await;
        ctx.set_center(Coordinates::new(-23.5505, -46.6333)).await;

        let decision = ctx.resolve("rua inexistente", 0).await?;

        assert!(!decision.eligible);
        assert_eq!(decision.matched_via, MatchedVia::NoMatch);

        Ok(())
    }

    #[tokio::test]
    async fn radius_mode_beyond_every_band_is_not_eligible() -> TestResult {
        let center = Coordinates::new(-23.5505, -46.6333);
        let destination = coords_km_north_of(center, 30.0);

        let ctx = TestContext::with_geocoder(move |mock| {
            mock.expect_geocode().times(1).returning(move |_| Ok(destination));
        })
        .await;
        ctx.set_mode(DeliveryMode::Radius).await;
        ctx.seed_band(0.0, 15.0, 10, 45).await;
        ctx.set_center(center).await;

        let decision = ctx.resolve("Rua Distante 999", 0).await?;

        assert!(!decision.eligible);

        Ok(())
    }

    #[tokio::test]
    async fn radius_mode_without_a_center_is_a_defect() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.set_mode(DeliveryMode::Radius).await;
        ctx.seed_band(0.0, 10.0, 10, 45).await;

        let result = ctx.resolve("Rua Nova 123", 0).await;

        assert!(
            matches!(result, Err(ResolveError::MissingCenter)),
            "expected MissingCenter, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn free_delivery_minimum_zeroes_the_fee_and_keeps_the_eta() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.seed_zone("Centro", DeliveryKind::Paid, 5, 30).await;
        ctx.set_free_delivery_minimum(100).await;

        let decision = ctx.resolve("Centro", 150).await?;

        assert!(decision.eligible);
        assert_eq!(decision.fee, Decimal::ZERO);
        assert_eq!(decision.eta_minutes, Some(30));
        assert_eq!(decision.matched_via, MatchedVia::Neighborhood);

        Ok(())
    }

    #[tokio::test]
    async fn subtotal_below_the_minimum_keeps_the_fee() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.seed_zone("Centro", DeliveryKind::Paid, 5, 30).await;
        ctx.set_free_delivery_minimum(100).await;

        let decision = ctx.resolve("Centro", 99).await?;

        assert_eq!(decision.fee, Decimal::from(5));

        Ok(())
    }

    #[tokio::test]
    async fn repeat_resolution_reuses_the_cached_geocode() -> TestResult {
        let center = Coordinates::new(-23.5505, -46.6333);
        let destination = coords_km_north_of(center, 7.0);

        let ctx = TestContext::with_geocoder(move |mock| {
            mock.expect_geocode().times(1).returning(move |_| Ok(destination));
        })
        .await;
        ctx.set_mode(DeliveryMode::Radius).await;
        ctx.seed_band(0.0, 15.0, 20, 60).await;
        ctx.set_center(center).await;

        let first = ctx.resolve("Rua Nova, 123", 0).await?;
        // Differently-formatted spelling of the same address hits the cache.
        let second = ctx.resolve("rua nova 123", 0).await?;

        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn configuration_edits_take_effect_despite_the_cache() -> TestResult {
        let center = Coordinates::new(-23.5505, -46.6333);
        let destination = coords_km_north_of(center, 7.0);

        let ctx = TestContext::with_geocoder(move |mock| {
            mock.expect_geocode().times(1).returning(move |_| Ok(destination));
        })
        .await;
        ctx.set_mode(DeliveryMode::Radius).await;
        let band = ctx.seed_band(0.0, 15.0, 20, 60).await;
        ctx.set_center(center).await;

        let before = ctx.resolve("Rua Nova 123", 0).await?;
        assert_eq!(before.fee, Decimal::from(20));

        ctx.ctx
            .bands
            .update_band(
                ctx.tenant,
                band.uuid,
                crate::bands::models::BandUpdate {
                    fee: Some(Decimal::from(25)),
                    ..Default::default()
                },
            )
            .await?;

        // Same address, no second geocode, but the new fee applies.
        let after = ctx.resolve("Rua Nova 123", 0).await?;
        assert_eq!(after.fee, Decimal::from(25));

        Ok(())
    }
}
