//! Radius ladder input models.

use entrega::geo::Coordinates;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// New Band Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBand {
    /// Inclusive lower bound in kilometres.
    pub km_start: f64,

    /// Exclusive upper bound in kilometres.
    pub km_end: f64,

    /// Delivery fee within the band; defaults to zero.
    #[serde(default)]
    pub fee: Decimal,

    /// Estimated delivery time in minutes.
    pub eta_minutes: u32,
}

/// Band Update Model; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandUpdate {
    /// New lower bound in kilometres.
    pub km_start: Option<f64>,

    /// New upper bound in kilometres.
    pub km_end: Option<f64>,

    /// New delivery fee.
    pub fee: Option<Decimal>,

    /// New ETA in minutes.
    pub eta_minutes: Option<u32>,

    /// Activate or retire the band.
    pub active: Option<bool>,
}

/// The tenant's store origin, from which all band distances are measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterPoint {
    /// The address as configured by the operator.
    pub address: String,

    /// Its geocoded coordinates.
    pub coordinates: Coordinates,
}
