//! Reverse geocoding: coordinate → human-readable place name.
//!
//! The production client talks to OpenStreetMap Nominatim. Any failure is
//! reported as `GeocodeUnavailable`; [`resolve_or_fallback`] turns that into
//! the synthesized `coordinate (lat, lng)` name so callers always get a string.

use super::address::{accept_language, coordinate_name, first_segment, format_address};
use super::types::{AddressComponents, Coordinate, LocationError};
use serde::Deserialize;
use std::time::Duration;

pub trait ReverseGeocoder: Send + Sync {
    /// Resolve a display name for `coordinate`, formatted for `locale`.
    fn resolve_place_name(&self, coordinate: Coordinate, locale: &str) -> Result<String, LocationError>;
}

/// Resolve a name, degrading to the synthesized coordinate name on error.
pub fn resolve_or_fallback(geocoder: &dyn ReverseGeocoder, coordinate: Coordinate, locale: &str) -> String {
    match geocoder.resolve_place_name(coordinate, locale) {
        Ok(name) => name,
        Err(e) => {
            log::warn!("Failed to get location name for ({}): {}", coordinate, e);
            coordinate_name(coordinate, locale)
        }
    }
}

// ─── Nominatim ──────────────────────────────────────────────────

pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_USER_AGENT: &str = "LocationPicker/0.3 (note-location-plugin)";
pub const DEFAULT_GEOCODE_TIMEOUT: Duration = Duration::from_secs(15);

/// Detail level requested from Nominatim (18 = building).
const ZOOM: &str = "18";

#[derive(Deserialize, Debug, Default)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Deserialize, Debug, Default)]
struct NominatimAddress {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    county: Option<String>,
    #[serde(default)]
    city_district: Option<String>,
    #[serde(default)]
    road: Option<String>,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    house_number: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<NominatimAddress> for AddressComponents {
    fn from(a: NominatimAddress) -> Self {
        Self {
            province: non_empty(a.state).or_else(|| non_empty(a.province)),
            city: non_empty(a.city),
            district: non_empty(a.district)
                .or_else(|| non_empty(a.county))
                .or_else(|| non_empty(a.city_district)),
            road: non_empty(a.road).or_else(|| non_empty(a.street)),
            house_number: non_empty(a.house_number),
        }
    }
}

/// Turn a Nominatim reverse response body into a display name.
pub fn place_name_from_response(body: &str, coordinate: Coordinate, locale: &str) -> Result<String, LocationError> {
    let response: ReverseResponse =
        serde_json::from_str(body).map_err(|e| LocationError::GeocodeUnavailable(format!("malformed response: {}", e)))?;

    let from_display_name = |display_name: Option<&str>| {
        display_name
            .map(first_segment)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| coordinate_name(coordinate, locale))
    };

    let name = match response.address {
        Some(address) => {
            let components = AddressComponents::from(address);
            format_address(&components, locale)
                .unwrap_or_else(|| from_display_name(response.display_name.as_deref()))
        }
        None => from_display_name(response.display_name.as_deref()),
    };
    Ok(name)
}

/// Nominatim reverse geocoding client (blocking, single request, no retries).
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NominatimGeocoder {
    pub fn new() -> Self {
        Self {
            endpoint: NOMINATIM_REVERSE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_GEOCODE_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new()
            .with_endpoint(config.nominatim_url.clone())
            .with_user_agent(config.user_agent.clone())
            .with_timeout(Duration::from_millis(config.geocode_timeout_ms))
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn resolve_place_name(&self, coordinate: Coordinate, locale: &str) -> Result<String, LocationError> {
        let response = ureq::get(&self.endpoint)
            .query("format", "json")
            .query("lat", &coordinate.latitude.to_string())
            .query("lon", &coordinate.longitude.to_string())
            .query("zoom", ZOOM)
            .query("addressdetails", "1")
            .set("Accept-Language", &accept_language(locale))
            .set("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .call()
            .map_err(|e| LocationError::GeocodeUnavailable(e.to_string()))?;

        let body = response
            .into_string()
            .map_err(|e| LocationError::GeocodeUnavailable(e.to_string()))?;

        place_name_from_response(&body, coordinate, locale)
    }
}
