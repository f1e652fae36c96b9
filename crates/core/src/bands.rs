//! Distance bands and the per-tenant radius ladder.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use uuid::Uuid;

/// A half-open distance interval `[km_start, km_end)` with its own fee and
/// ETA, measured from the tenant's center point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusBand {
    /// Unique band identifier.
    pub uuid: Uuid,
    /// Inclusive lower bound in kilometres.
    pub km_start: f64,
    /// Exclusive upper bound in kilometres.
    pub km_end: f64,
    /// Delivery fee within the band.
    pub fee: Decimal,
    /// Estimated delivery time in minutes.
    pub eta_minutes: u32,
    /// Inactive bands are never selected.
    pub active: bool,
}

impl RadiusBand {
    /// Whether `distance_km` falls inside the band's interval.
    #[must_use]
    pub fn contains(&self, distance_km: f64) -> bool {
        self.km_start <= distance_km && distance_km < self.km_end
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.km_start < other.km_end && self.km_end > other.km_start
    }
}

/// Validation and selection failures for the radius ladder.
#[derive(Debug, Error, PartialEq)]
pub enum LadderError {
    /// Bounds must be finite, non-negative, and `km_start < km_end`.
    #[error("invalid band interval [{start}, {end})")]
    InvalidInterval {
        /// Proposed lower bound.
        start: f64,
        /// Proposed upper bound.
        end: f64,
    },

    /// The fee is below zero.
    #[error("band fee must not be negative")]
    NegativeFee,

    /// The ETA must be at least one minute.
    #[error("band eta must be a positive number of minutes")]
    ZeroEta,

    /// The proposed interval overlaps an existing active band.
    #[error("band [{start}, {end}) overlaps active band [{other_start}, {other_end})")]
    Overlap {
        /// Proposed lower bound.
        start: f64,
        /// Proposed upper bound.
        end: f64,
        /// Conflicting band's lower bound.
        other_start: f64,
        /// Conflicting band's upper bound.
        other_end: f64,
    },

    /// No band with the given id.
    #[error("band not found")]
    NotFound,

    /// A negative or non-finite distance reached band selection; the
    /// caller's distance computation violated its contract.
    #[error("distance must be finite and non-negative, got {0}")]
    InvalidDistance(f64),
}

/// An ordered set of non-overlapping distance bands.
///
/// Overlap among active bands is rejected at write time, which is what makes
/// [`RadiusLadder::band_for`] unambiguous at read time. A rejected mutation
/// leaves the ladder exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct RadiusLadder {
    bands: SmallVec<[RadiusBand; 4]>,
}

impl RadiusLadder {
    /// Create an empty ladder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a band, keeping the ladder sorted by lower bound.
    ///
    /// # Errors
    ///
    /// Returns a [`LadderError`] when the interval is malformed or overlaps
    /// an existing active band.
    pub fn insert(&mut self, band: RadiusBand) -> Result<(), LadderError> {
        Self::validate_fields(&band)?;
        self.check_overlap(&band, None)?;

        let at = self.insertion_point(&band);
        self.bands.insert(at, band);

        Ok(())
    }

    /// Replace the band with the same id, re-validating against the set
    /// excluding the band being replaced.
    ///
    /// # Errors
    ///
    /// Returns [`LadderError::NotFound`] for an unknown id, otherwise the
    /// same validation errors as [`RadiusLadder::insert`].
    pub fn replace(&mut self, band: RadiusBand) -> Result<(), LadderError> {
        let current = self
            .bands
            .iter()
            .position(|b| b.uuid == band.uuid)
            .ok_or(LadderError::NotFound)?;

        Self::validate_fields(&band)?;
        self.check_overlap(&band, Some(band.uuid))?;

        self.bands.remove(current);
        let at = self.insertion_point(&band);
        self.bands.insert(at, band);

        Ok(())
    }

    /// Remove a band, returning it when present.
    pub fn remove(&mut self, uuid: Uuid) -> Option<RadiusBand> {
        let index = self.bands.iter().position(|b| b.uuid == uuid)?;

        Some(self.bands.remove(index))
    }

    /// The band with the given id.
    #[must_use]
    pub fn get(&self, uuid: Uuid) -> Option<&RadiusBand> {
        self.bands.iter().find(|b| b.uuid == uuid)
    }

    /// The unique active band containing `distance_km`, or `Ok(None)` when
    /// the distance is beyond every band; the address is outside delivery
    /// coverage, an expected outcome.
    ///
    /// # Errors
    ///
    /// Returns [`LadderError::InvalidDistance`] for negative or non-finite
    /// distances: those cannot come from a correct distance computation and
    /// must not be absorbed into a quiet "no coverage" answer.
    pub fn band_for(&self, distance_km: f64) -> Result<Option<&RadiusBand>, LadderError> {
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(LadderError::InvalidDistance(distance_km));
        }

        Ok(self
            .bands
            .iter()
            .find(|b| b.active && b.contains(distance_km)))
    }

    /// All bands, sorted by lower bound.
    pub fn iter(&self) -> impl Iterator<Item = &RadiusBand> {
        self.bands.iter()
    }

    /// Number of bands, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Whether the ladder is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    fn insertion_point(&self, band: &RadiusBand) -> usize {
        self.bands
            .iter()
            .position(|b| b.km_start > band.km_start)
            .unwrap_or(self.bands.len())
    }

    fn validate_fields(band: &RadiusBand) -> Result<(), LadderError> {
        let bounds_valid = band.km_start.is_finite()
            && band.km_end.is_finite()
            && band.km_start >= 0.0
            && band.km_start < band.km_end;

        if !bounds_valid {
            return Err(LadderError::InvalidInterval {
                start: band.km_start,
                end: band.km_end,
            });
        }

        if band.fee < Decimal::ZERO {
            return Err(LadderError::NegativeFee);
        }

        if band.eta_minutes == 0 {
            return Err(LadderError::ZeroEta);
        }

        Ok(())
    }

    fn check_overlap(&self, band: &RadiusBand, exclude: Option<Uuid>) -> Result<(), LadderError> {
        if !band.active {
            return Ok(());
        }

        if let Some(other) = self
            .bands
            .iter()
            .filter(|b| b.active && Some(b.uuid) != exclude)
            .find(|b| b.overlaps(band))
        {
            return Err(LadderError::Overlap {
                start: band.km_start,
                end: band.km_end,
                other_start: other.km_start,
                other_end: other.km_end,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn band(km_start: f64, km_end: f64, fee: i64) -> RadiusBand {
        RadiusBand {
            uuid: Uuid::now_v7(),
            km_start,
            km_end,
            fee: Decimal::from(fee),
            eta_minutes: 45,
            active: true,
        }
    }

    fn ladder(bands: impl IntoIterator<Item = RadiusBand>) -> TestResult<RadiusLadder> {
        let mut ladder = RadiusLadder::new();

        for b in bands {
            ladder.insert(b)?;
        }

        Ok(ladder)
    }

    #[test]
    fn overlapping_band_is_rejected_and_ladder_unchanged() -> TestResult {
        let mut ladder = ladder([band(5.0, 10.0, 10)])?;

        let result = ladder.insert(band(8.0, 12.0, 15));

        assert!(
            matches!(result, Err(LadderError::Overlap { .. })),
            "expected Overlap, got {result:?}"
        );
        assert_eq!(ladder.len(), 1);

        Ok(())
    }

    #[test]
    fn adjacent_bands_do_not_overlap() -> TestResult {
        let ladder = ladder([band(0.0, 5.0, 0), band(5.0, 10.0, 10)])?;

        assert_eq!(ladder.len(), 2);

        Ok(())
    }

    #[test]
    fn inactive_band_may_overlap_active_ones() -> TestResult {
        let mut ladder = ladder([band(0.0, 10.0, 10)])?;
        let mut retired = band(5.0, 15.0, 20);
        retired.active = false;

        ladder.insert(retired)?;

        assert_eq!(ladder.len(), 2);

        Ok(())
    }

    #[test]
    fn inverted_or_negative_intervals_are_rejected() {
        let mut ladder = RadiusLadder::new();

        for bad in [band(10.0, 5.0, 10), band(5.0, 5.0, 10), band(-1.0, 5.0, 10)] {
            let result = ladder.insert(bad);

            assert!(
                matches!(result, Err(LadderError::InvalidInterval { .. })),
                "expected InvalidInterval, got {result:?}"
            );
        }

        assert!(ladder.is_empty());
    }

    #[test]
    fn negative_fee_and_zero_eta_are_rejected() {
        let mut ladder = RadiusLadder::new();

        assert_eq!(ladder.insert(band(0.0, 5.0, -1)), Err(LadderError::NegativeFee));

        let mut no_eta = band(0.0, 5.0, 10);
        no_eta.eta_minutes = 0;

        assert_eq!(ladder.insert(no_eta), Err(LadderError::ZeroEta));
    }

    #[test]
    fn band_for_selects_by_half_open_interval() -> TestResult {
        let ladder = ladder([band(0.0, 5.0, 0), band(5.0, 15.0, 20)])?;

        let at_zero = ladder.band_for(0.0)?.expect("no band at 0");
        assert_eq!(at_zero.fee, Decimal::ZERO);

        // The boundary belongs to the upper band.
        let at_five = ladder.band_for(5.0)?.expect("no band at 5");
        assert_eq!(at_five.fee, Decimal::from(20));

        assert!(ladder.band_for(15.0)?.is_none());
        assert!(ladder.band_for(100.0)?.is_none());

        Ok(())
    }

    #[test]
    fn band_for_skips_inactive_bands() -> TestResult {
        let mut ladder = RadiusLadder::new();
        let mut b = band(0.0, 5.0, 10);
        b.active = false;
        ladder.insert(b)?;

        assert!(ladder.band_for(2.0)?.is_none());

        Ok(())
    }

    #[test]
    fn negative_and_non_finite_distances_are_defects() -> TestResult {
        let ladder = ladder([band(0.0, 5.0, 10)])?;

        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            let result = ladder.band_for(bad);

            assert!(
                matches!(result, Err(LadderError::InvalidDistance(_))),
                "expected InvalidDistance for {bad}, got {result:?}"
            );
        }

        Ok(())
    }

    #[test]
    fn at_most_one_active_band_matches_any_distance() -> TestResult {
        let ladder = ladder([band(0.0, 3.5, 0), band(3.5, 8.0, 10), band(9.0, 20.0, 25)])?;

        let mut d = 0.0;
        while d < 25.0 {
            let matching = ladder.iter().filter(|b| b.active && b.contains(d)).count();

            assert!(matching <= 1, "distance {d} matched {matching} bands");
            d += 0.25;
        }

        Ok(())
    }

    #[test]
    fn replace_revalidates_excluding_the_band_itself() -> TestResult {
        let mut ladder = RadiusLadder::new();
        let original = band(0.0, 5.0, 10);
        let uuid = original.uuid;
        ladder.insert(original)?;
        ladder.insert(band(5.0, 10.0, 20))?;

        // Shrinking its own interval cannot collide with itself.
        let mut shrunk = ladder.get(uuid).cloned().expect("band missing");
        shrunk.km_end = 4.0;
        ladder.replace(shrunk)?;

        // Growing into the neighbour is rejected and nothing changes.
        let mut grown = ladder.get(uuid).cloned().expect("band missing");
        grown.km_end = 7.0;
        let result = ladder.replace(grown);

        assert!(
            matches!(result, Err(LadderError::Overlap { .. })),
            "expected Overlap, got {result:?}"
        );
        let current = ladder.get(uuid).expect("band missing");
        assert_eq!(current.km_end, 4.0);

        Ok(())
    }

    #[test]
    fn bands_stay_sorted_by_lower_bound() -> TestResult {
        let ladder = ladder([band(10.0, 15.0, 25), band(0.0, 5.0, 0), band(5.0, 10.0, 10)])?;

        let starts: Vec<f64> = ladder.iter().map(|b| b.km_start).collect();

        assert_eq!(starts, vec![0.0, 5.0, 10.0]);

        Ok(())
    }
}
