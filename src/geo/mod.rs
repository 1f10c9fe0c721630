// IP geolocation lookup for the analyst map

pub mod tiles;

use crate::config::GeoConfig;
use crate::error::{Result, TriageError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Zoom level used when the origin resolved to a point.
const ORIGIN_ZOOM: u8 = 10;

/// Default world view shown when no origin could be resolved.
pub const WORLD_VIEW: MapView = MapView {
    lat: 20.0,
    lon: 0.0,
    zoom: 2,
};

/// Where the analyst map should center itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

impl MapView {
    pub fn for_location(location: &GeoLocation) -> Self {
        Self {
            lat: location.lat,
            lon: location.lon,
            zoom: ORIGIN_ZOOM,
        }
    }
}

/// Fields consumed from the lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    pub city: String,
    pub country_code: String,
    pub org: String,
}

/// Raw reply shape of the ip-api.com `/json/{ip}` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    country_code: Option<String>,
    org: Option<String>,
}

/// Client for the unauthenticated IP-geolocation service.
///
/// Every failure here is non-fatal: the caller logs it and falls back to the
/// default world view.
pub struct GeoClient {
    http_client: Client,
    base_url: String,
}

impl GeoClient {
    pub fn new(config: &GeoConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| TriageError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up the coordinates and network owner for an IP string.
    pub async fn lookup(&self, ip: &str) -> Result<GeoLocation> {
        let url = format!("{}/json/{}", self.base_url, urlencoding::encode(ip));
        debug!("Geolocation lookup via {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| TriageError::Geo(format!("HTTP error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriageError::Geo(format!("HTTP {}", status)));
        }

        let reply: LookupResponse = response
            .json()
            .await
            .map_err(|e| TriageError::Geo(format!("Invalid reply: {}", e)))?;

        if reply.status != "success" {
            return Err(TriageError::Geo(
                reply.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }

        match (reply.lat, reply.lon) {
            (Some(lat), Some(lon)) => Ok(GeoLocation {
                lat,
                lon,
                city: reply.city.unwrap_or_default(),
                country_code: reply.country_code.unwrap_or_default(),
                org: reply.org.unwrap_or_default(),
            }),
            _ => Err(TriageError::Geo("reply missing coordinates".to_string())),
        }
    }
}
