//! Zones service errors.

use entrega::zones::ZoneError;
use thiserror::Error;

/// Zone service error variants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZonesServiceError {
    /// Zone was not found.
    #[error("zone not found")]
    NotFound,

    /// The mutation failed validation and the registry is unchanged.
    #[error("invalid zone data")]
    InvalidZone(#[source] ZoneError),
}

impl From<ZoneError> for ZonesServiceError {
    fn from(error: ZoneError) -> Self {
        match error {
            ZoneError::NotFound => Self::NotFound,
            error => Self::InvalidZone(error),
        }
    }
}
