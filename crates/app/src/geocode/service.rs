//! Geocoder seam.

use async_trait::async_trait;
use entrega::geo::Coordinates;
use mockall::automock;

use crate::geocode::errors::GeocodeError;

/// Converts a free-text address into coordinates.
///
/// Provider calls are rate- and cost-bearing; the address cache exists to
/// keep them to a minimum, and callers are expected to bound each call with
/// a timeout.
#[automock]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `address` to coordinates.
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}
