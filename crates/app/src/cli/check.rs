//! `check` subcommand: dry-run an address against a configuration file.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use clap::Args;
use entrega::{
    config::DeliveryMode,
    decision::DeliveryDecision,
    geo::Coordinates,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tabled::{Table, Tabled};
use zeroize::Zeroizing;

use entrega_app::{
    bands::models::{CenterPoint, NewBand},
    context::AppContext,
    geocode::{GeocodeError, Geocoder, GeocoderConfig, HttpGeocoder},
    tenants::TenantId,
    zones::models::NewZone,
};

/// Arguments for `check`.
#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    /// Delivery configuration file (YAML).
    #[arg(long)]
    config: PathBuf,

    /// Customer address to resolve.
    #[arg(long)]
    address: String,

    /// Order subtotal used for the free-delivery minimum.
    #[arg(long, default_value = "0")]
    subtotal: Decimal,

    /// Geocoding provider base URL; required for radius lookups.
    #[arg(long, env = "GEOCODER_URL")]
    geocoder_url: Option<String>,

    /// Geocoding provider API key.
    #[arg(long, env = "GEOCODER_API_KEY", hide_env_values = true)]
    geocoder_api_key: Option<String>,
}

/// On-disk tenant delivery configuration.
#[derive(Debug, Deserialize)]
struct CheckConfig {
    #[serde(default)]
    mode: DeliveryMode,

    #[serde(default)]
    free_delivery_minimum: Option<Decimal>,

    #[serde(default)]
    center: Option<CenterConfig>,

    #[serde(default)]
    zones: Vec<NewZone>,

    #[serde(default)]
    bands: Vec<NewBand>,
}

#[derive(Debug, Deserialize)]
struct CenterConfig {
    address: String,

    /// Pre-resolved coordinates; when omitted the address is geocoded.
    #[serde(default)]
    coordinates: Option<Coordinates>,
}

/// Stand-in used when no provider is configured; any geocode attempt fails
/// with a pointer at the missing setting instead of a connection error.
#[derive(Debug)]
struct UnconfiguredGeocoder;

#[async_trait]
impl Geocoder for UnconfiguredGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Coordinates, GeocodeError> {
        Err(GeocodeError::UnexpectedResponse(
            "no geocoding provider configured; set GEOCODER_URL".to_string(),
        ))
    }
}

#[derive(Tabled)]
struct ZoneRow {
    name: String,
    kind: String,
    fee: Decimal,
    eta_minutes: u32,
    active: bool,
}

#[derive(Tabled)]
struct BandRow {
    from_km: f64,
    to_km: f64,
    fee: Decimal,
    eta_minutes: u32,
    active: bool,
}

#[derive(Tabled)]
struct DecisionRow {
    eligible: bool,
    fee: Decimal,
    eta_minutes: String,
    matched_via: String,
}

pub(crate) async fn run(args: CheckArgs) -> Result<(), String> {
    let raw = std::fs::read_to_string(&args.config)
        .map_err(|error| format!("failed to read {}: {error}", args.config.display()))?;

    let config: CheckConfig = serde_norway::from_str(&raw)
        .map_err(|error| format!("invalid configuration file: {error}"))?;

    let geocoder: Arc<dyn Geocoder> = match args.geocoder_url {
        Some(base_url) => Arc::new(HttpGeocoder::new(GeocoderConfig {
            base_url,
            api_key: args.geocoder_api_key.map(Zeroizing::new),
        })),
        None => Arc::new(UnconfiguredGeocoder),
    };

    let ctx = AppContext::in_memory(geocoder);
    let tenant = TenantId::random();

    seed(&ctx, tenant, config).await?;

    let decision = ctx
        .resolver
        .resolve_for_tenant(tenant, &args.address, args.subtotal)
        .await
        .map_err(|error| format!("resolution failed: {error}"))?;

    print_report(&ctx, tenant, &args.address, &decision).await;

    Ok(())
}

async fn seed(ctx: &AppContext, tenant: TenantId, config: CheckConfig) -> Result<(), String> {
    ctx.configs
        .set_mode(tenant, config.mode)
        .await
        .map_err(|error| format!("failed to set mode: {error}"))?;

    ctx.configs
        .set_free_delivery_minimum(tenant, config.free_delivery_minimum)
        .await
        .map_err(|error| format!("invalid free-delivery minimum: {error}"))?;

    ctx.zones
        .add_zones(tenant, config.zones)
        .await
        .map_err(|error| format!("invalid zone configuration: {error}"))?;

    ctx.bands
        .add_bands(tenant, config.bands)
        .await
        .map_err(|error| format!("invalid band configuration: {error}"))?;

    if let Some(center) = config.center {
        match center.coordinates {
            Some(coordinates) => ctx
                .bands
                .set_center_resolved(
                    tenant,
                    CenterPoint {
                        address: center.address,
                        coordinates,
                    },
                )
                .await
                .map_err(|error| format!("failed to store center: {error}"))?,
            None => {
                ctx.bands
                    .set_center(tenant, &center.address)
                    .await
                    .map_err(|error| format!("failed to geocode center: {error}"))?;
            }
        }
    }

    Ok(())
}

async fn print_report(
    ctx: &AppContext,
    tenant: TenantId,
    address: &str,
    decision: &DeliveryDecision,
) {
    if let Ok(zones) = ctx.zones.list_zones(tenant).await
        && !zones.is_empty()
    {
        let rows: Vec<ZoneRow> = zones
            .into_iter()
            .map(|zone| ZoneRow {
                name: zone.name,
                kind: format!("{:?}", zone.kind).to_lowercase(),
                fee: zone.fee,
                eta_minutes: zone.eta_minutes,
                active: zone.active,
            })
            .collect();

        println!("zones:");
        println!("{}", Table::new(rows));
    }

    if let Ok(bands) = ctx.bands.list_bands(tenant).await
        && !bands.is_empty()
    {
        let rows: Vec<BandRow> = bands
            .into_iter()
            .map(|band| BandRow {
                from_km: band.km_start,
                to_km: band.km_end,
                fee: band.fee,
                eta_minutes: band.eta_minutes,
                active: band.active,
            })
            .collect();

        println!("bands:");
        println!("{}", Table::new(rows));
    }

    println!("decision for {address:?}:");
    println!(
        "{}",
        Table::new([DecisionRow {
            eligible: decision.eligible,
            fee: decision.fee,
            eta_minutes: decision
                .eta_minutes
                .map_or_else(|| "-".to_string(), |eta| eta.to_string()),
            matched_via: decision.matched_via.to_string(),
        }])
    );
}
