//! Tenant-level delivery configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a tenant resolves delivery eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Match the customer address against registered zones only.
    #[default]
    Neighborhood,
    /// Geocode the address and match distance bands only.
    Radius,
    /// Zone match first, distance bands as fallback for unregistered names.
    Hybrid,
}

/// Per-tenant delivery settings.
///
/// Owned by the tenant and mutated only through explicit configuration
/// operations, never inferred from resolution traffic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Active resolution mode.
    pub mode: DeliveryMode,
    /// Order subtotal at or above which delivery is free, regardless of the
    /// matched zone or band fee.
    pub free_delivery_minimum: Option<Decimal>,
}
