//! HTTP client for the geocoding provider.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use entrega::geo::Coordinates;
use reqwest::Client;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::geocode::{errors::GeocodeError, service::Geocoder};

/// Configuration for connecting to the geocoding provider.
#[derive(Clone)]
pub struct GeocoderConfig {
    /// Provider base address, e.g. `"https://geocode.example.com"`.
    pub base_url: String,

    /// Optional API key, sent as the `X-Api-Key` header.
    pub api_key: Option<Zeroizing<String>>,
}

impl Debug for GeocoderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeocoderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Geocoding provider client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    config: GeocoderConfig,
    http: Client,
}

impl HttpGeocoder {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: GeocoderConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let url = format!("{}/geocode", self.config.base_url);

        let mut request = self.http.get(&url).query(&[("q", address)]);

        if let Some(key) = &self.config.api_key {
            request = request.header("X-Api-Key", key.as_str());
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(GeocodeError::UnexpectedResponse(format!(
                "geocode request failed with status {status}: {text}"
            )));
        }

        let parsed: GeocodeResponse = response.json().await?;

        let Some(result) = parsed.results.into_iter().next() else {
            return Err(GeocodeError::NotFound);
        };

        Ok(Coordinates::new(result.lat, result.lng))
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    lat: f64,
    lng: f64,
}
