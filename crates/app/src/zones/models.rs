//! Zone registry input models.

use entrega::zones::DeliveryKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// New Zone Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewZone {
    /// Display name for the neighborhood.
    pub name: String,

    /// Optional city disambiguator.
    #[serde(default)]
    pub city: Option<String>,

    /// Optional state disambiguator.
    #[serde(default)]
    pub state: Option<String>,

    /// Delivery policy.
    pub kind: DeliveryKind,

    /// Delivery fee; defaults to zero.
    #[serde(default)]
    pub fee: Decimal,

    /// Estimated delivery time in minutes.
    pub eta_minutes: u32,
}

/// Zone Update Model; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneUpdate {
    /// New display name.
    pub name: Option<String>,

    /// New delivery policy.
    pub kind: Option<DeliveryKind>,

    /// New delivery fee.
    pub fee: Option<Decimal>,

    /// New ETA in minutes.
    pub eta_minutes: Option<u32>,

    /// Activate or retire the zone.
    pub active: Option<bool>,
}
