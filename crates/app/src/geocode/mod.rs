//! Geocoding collaborator.

mod client;
pub mod errors;
pub mod service;

pub use client::{GeocoderConfig, HttpGeocoder};
pub use errors::GeocodeError;
pub use service::*;
