//! Delivery decisions returned to the order flow.

use std::fmt::{Display, Formatter, Result as FmtResult};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    bands::RadiusBand,
    zones::{DeliveryKind, Zone},
};

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedVia {
    /// A registered zone matched the address.
    Neighborhood,
    /// A distance band matched the geocoded address.
    Radius,
    /// Nothing matched.
    #[serde(rename = "none")]
    NoMatch,
}

impl Display for MatchedVia {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::Neighborhood => "neighborhood",
            Self::Radius => "radius",
            Self::NoMatch => "none",
        };

        f.write_str(label)
    }
}

/// The outcome of resolving one customer address.
///
/// Non-eligibility is an ordinary value of this type; the order flow turns it
/// into a "we don't deliver there" message, never into an error path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDecision {
    /// Whether the tenant delivers to the address.
    pub eligible: bool,
    /// Fee charged when eligible.
    pub fee: Decimal,
    /// Estimated delivery time, when a rule matched.
    pub eta_minutes: Option<u32>,
    /// Which rule produced the decision.
    pub matched_via: MatchedVia,
}

impl DeliveryDecision {
    /// Not deliverable; nothing matched.
    #[must_use]
    pub fn ineligible() -> Self {
        Self {
            eligible: false,
            fee: Decimal::ZERO,
            eta_minutes: None,
            matched_via: MatchedVia::NoMatch,
        }
    }

    /// Decision for a matched zone.
    ///
    /// An [`DeliveryKind::Unavailable`] zone yields an ineligible decision
    /// that still records the zone match: the name *is* registered, the
    /// tenant just refuses it.
    #[must_use]
    pub fn from_zone(zone: &Zone) -> Self {
        match zone.kind {
            DeliveryKind::Unavailable => Self {
                eligible: false,
                fee: Decimal::ZERO,
                eta_minutes: None,
                matched_via: MatchedVia::Neighborhood,
            },
            DeliveryKind::Free => Self {
                eligible: true,
                fee: Decimal::ZERO,
                eta_minutes: Some(zone.eta_minutes),
                matched_via: MatchedVia::Neighborhood,
            },
            DeliveryKind::Paid => Self {
                eligible: true,
                fee: zone.fee,
                eta_minutes: Some(zone.eta_minutes),
                matched_via: MatchedVia::Neighborhood,
            },
        }
    }

    /// Decision for a matched distance band.
    #[must_use]
    pub fn from_band(band: &RadiusBand) -> Self {
        Self {
            eligible: true,
            fee: band.fee,
            eta_minutes: Some(band.eta_minutes),
            matched_via: MatchedVia::Radius,
        }
    }

    /// Apply the tenant's free-delivery minimum: an eligible decision with
    /// `subtotal` at or above the minimum has its fee forced to zero. ETA
    /// and match source are left untouched.
    #[must_use]
    pub fn with_free_delivery_minimum(mut self, subtotal: Decimal, minimum: Option<Decimal>) -> Self {
        if self.eligible && minimum.is_some_and(|m| subtotal >= m) {
            self.fee = Decimal::ZERO;
        }

        self
    }
}
