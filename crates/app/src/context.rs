//! App Context

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use crate::{
    bands::{BandsService, InMemoryBandsService},
    cache::AddressCache,
    configs::{DeliveryConfigsService, InMemoryDeliveryConfigsService},
    geocode::Geocoder,
    resolver::DeliveryResolver,
    zones::{InMemoryZonesService, ZonesService},
};

/// Shared handles to every delivery service.
#[derive(Clone)]
pub struct AppContext {
    /// Zone registry.
    pub zones: Arc<dyn ZonesService>,
    /// Radius ladder and center point store.
    pub bands: Arc<dyn BandsService>,
    /// Delivery configuration store.
    pub configs: Arc<dyn DeliveryConfigsService>,
    /// Cache of geocoded addresses.
    pub cache: Arc<AddressCache>,
    /// The orchestrating resolver.
    pub resolver: Arc<DeliveryResolver>,
}

impl AppContext {
    /// Build a context backed by in-memory stores around the given geocoder.
    #[must_use]
    pub fn in_memory(geocoder: Arc<dyn Geocoder>) -> Self {
        let zones: Arc<dyn ZonesService> = Arc::new(InMemoryZonesService::new());
        let bands: Arc<dyn BandsService> =
            Arc::new(InMemoryBandsService::new(Arc::clone(&geocoder)));
        let configs: Arc<dyn DeliveryConfigsService> =
            Arc::new(InMemoryDeliveryConfigsService::new());
        let cache = Arc::new(AddressCache::default());

        let resolver = Arc::new(DeliveryResolver::new(
            Arc::clone(&zones),
            Arc::clone(&bands),
            Arc::clone(&configs),
            geocoder,
            Arc::clone(&cache),
        ));

        Self {
            zones,
            bands,
            configs,
            cache,
            resolver,
        }
    }
}

impl Debug for AppContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}
