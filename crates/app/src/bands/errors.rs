//! Bands service errors.

use entrega::bands::LadderError;
use thiserror::Error;

use crate::geocode::GeocodeError;

/// Band service error variants.
#[derive(Debug, Error)]
pub enum BandsServiceError {
    /// Band was not found.
    #[error("band not found")]
    NotFound,

    /// The mutation failed validation and the ladder is unchanged.
    #[error("invalid band configuration")]
    InvalidBand(#[source] LadderError),

    /// The center address could not be geocoded, so no band is usable.
    #[error("center address could not be geocoded")]
    CenterUnresolvable(#[source] GeocodeError),
}

impl From<LadderError> for BandsServiceError {
    fn from(error: LadderError) -> Self {
        match error {
            LadderError::NotFound => Self::NotFound,
            error => Self::InvalidBand(error),
        }
    }
}
