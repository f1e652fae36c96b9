//! Named delivery zones and the per-tenant zone set.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::address::{NormalizedAddress, normalize};

/// Delivery policy attached to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    /// Delivered at no charge.
    Free,
    /// Delivered for the configured fee.
    Paid,
    /// The zone is known but not served.
    Unavailable,
}

/// A named neighborhood with its delivery policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Unique zone identifier.
    pub uuid: Uuid,
    /// Display name, matched case- and accent-insensitively.
    pub name: String,
    /// Optional city disambiguator.
    pub city: Option<String>,
    /// Optional state disambiguator.
    pub state: Option<String>,
    /// Delivery policy for the zone.
    pub kind: DeliveryKind,
    /// Delivery fee; zero unless `kind` is [`DeliveryKind::Paid`].
    pub fee: Decimal,
    /// Estimated delivery time in minutes.
    pub eta_minutes: u32,
    /// Inactive zones are never matched.
    pub active: bool,
}

impl Zone {
    /// The name as used for matching.
    #[must_use]
    pub fn normalized_name(&self) -> NormalizedAddress {
        normalize(&self.name)
    }
}

/// Validation failures for zone mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneError {
    /// The name is empty after normalization.
    #[error("zone name must not be empty")]
    EmptyName,

    /// The fee is below zero.
    #[error("zone fee must not be negative")]
    NegativeFee,

    /// A free-delivery zone carried a non-zero fee.
    #[error("free-delivery zones must have a zero fee")]
    FeeOnFreeZone,

    /// The ETA must be at least one minute.
    #[error("zone eta must be a positive number of minutes")]
    ZeroEta,

    /// Another active zone already uses the name.
    #[error("an active zone named {0:?} already exists")]
    DuplicateName(String),

    /// No zone with the given id.
    #[error("zone not found")]
    NotFound,
}

/// The set of zones configured for one tenant.
///
/// All write operations validate before mutating; a rejected mutation leaves
/// the set exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] when a field is invalid or an active zone with
    /// the same normalized name already exists.
    pub fn insert(&mut self, zone: Zone) -> Result<(), ZoneError> {
        Self::validate_fields(&zone)?;
        self.check_duplicate_name(&zone, None)?;
        self.zones.push(zone);

        Ok(())
    }

    /// Replace the zone with the same id, re-validating against the rest of
    /// the set.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::NotFound`] for an unknown id, otherwise the same
    /// validation errors as [`ZoneSet::insert`].
    pub fn replace(&mut self, zone: Zone) -> Result<(), ZoneError> {
        let index = self
            .zones
            .iter()
            .position(|z| z.uuid == zone.uuid)
            .ok_or(ZoneError::NotFound)?;

        Self::validate_fields(&zone)?;
        self.check_duplicate_name(&zone, Some(zone.uuid))?;

        if let Some(slot) = self.zones.get_mut(index) {
            *slot = zone;
        }

        Ok(())
    }

    /// Remove a zone, returning it when present.
    pub fn remove(&mut self, uuid: Uuid) -> Option<Zone> {
        let index = self.zones.iter().position(|z| z.uuid == uuid)?;

        Some(self.zones.remove(index))
    }

    /// The zone with the given id.
    #[must_use]
    pub fn get(&self, uuid: Uuid) -> Option<&Zone> {
        self.zones.iter().find(|z| z.uuid == uuid)
    }

    /// Exact-equality lookup on the normalized name; active zones only.
    ///
    /// `None` means the name is not registered at all; it is the expected
    /// miss outcome, not a failure.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Zone> {
        let needle = normalize(name);

        if needle.is_empty() {
            return None;
        }

        self.zones
            .iter()
            .find(|z| z.active && z.normalized_name() == needle)
    }

    /// All zones, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Number of zones, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    fn validate_fields(zone: &Zone) -> Result<(), ZoneError> {
        if zone.normalized_name().is_empty() {
            return Err(ZoneError::EmptyName);
        }

        if zone.fee < Decimal::ZERO {
            return Err(ZoneError::NegativeFee);
        }

        if zone.kind == DeliveryKind::Free && !zone.fee.is_zero() {
            return Err(ZoneError::FeeOnFreeZone);
        }

        if zone.eta_minutes == 0 {
            return Err(ZoneError::ZeroEta);
        }

        Ok(())
    }

    fn check_duplicate_name(&self, zone: &Zone, exclude: Option<Uuid>) -> Result<(), ZoneError> {
        if !zone.active {
            return Ok(());
        }

        let name = zone.normalized_name();

        let taken = self
            .zones
            .iter()
            .filter(|z| z.active && Some(z.uuid) != exclude)
            .any(|z| z.normalized_name() == name);

        if taken {
            return Err(ZoneError::DuplicateName(zone.name.clone()));
        }

        Ok(())
    }
}
