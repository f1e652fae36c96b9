//! Geocoder errors.

use thiserror::Error;

/// Errors that can occur when talking to the geocoding provider.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// An HTTP transport or deserialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-2xx response or an unexpected body.
    #[error("unexpected response from geocoding provider: {0}")]
    UnexpectedResponse(String),

    /// The provider had no match for the address.
    #[error("address could not be geocoded")]
    NotFound,
}
