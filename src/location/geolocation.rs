//! Device position acquisition.
//!
//! Exactly one attempt per picker mount, bounded by a timeout. Callers fall
//! back to [`DEFAULT_COORDINATE`] on any failure.

use super::types::{Coordinate, LocationError};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Used when no position can be acquired (Beijing).
pub const DEFAULT_COORDINATE: Coordinate = Coordinate {
    latitude: 39.9042,
    longitude: 116.4074,
};

pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_millis(10_000);

pub trait Geolocator: Send + Sync {
    fn current_position(&self, high_accuracy: bool) -> Result<Coordinate, LocationError>;
}

/// Ask `geolocator` for the current position once.
///
/// `None` means the platform has no geolocation capability.
pub async fn acquire_current_coordinate(
    geolocator: Option<Arc<dyn Geolocator>>,
    timeout: Duration,
) -> Result<Coordinate, LocationError> {
    let geolocator = geolocator.ok_or(LocationError::UnsupportedPlatform)?;

    let task = tokio::task::spawn_blocking(move || geolocator.current_position(true));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result.map_err(|e| match e {
            LocationError::UnsupportedPlatform | LocationError::PositionUnavailable(_) => e,
            other => LocationError::PositionUnavailable(other.to_string()),
        }),
        Ok(Err(join)) => Err(LocationError::PositionUnavailable(join.to_string())),
        Err(_) => Err(LocationError::PositionUnavailable(format!(
            "timed out after {} ms",
            timeout.as_millis()
        ))),
    }
}

// ─── Providers ──────────────────────────────────────────────────

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinate);

impl Geolocator for FixedGeolocator {
    fn current_position(&self, _high_accuracy: bool) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// A platform without geolocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

impl Geolocator for NoGeolocation {
    fn current_position(&self, _high_accuracy: bool) -> Result<Coordinate, LocationError> {
        Err(LocationError::UnsupportedPlatform)
    }
}

pub const IP_GEOLOCATION_URL: &str = "https://ipapi.co/json/";

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// IP-based position lookup. Coarse, so `high_accuracy` is ignored.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl IpGeolocator {
    pub fn new(endpoint: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
            timeout: GEOLOCATION_TIMEOUT,
        }
    }

    /// Bound on the whole HTTP exchange.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.ip_geolocation_url.clone(), config.user_agent.clone())
            .with_timeout(Duration::from_millis(config.geolocation_timeout_ms))
    }
}

impl Geolocator for IpGeolocator {
    fn current_position(&self, _high_accuracy: bool) -> Result<Coordinate, LocationError> {
        let response = ureq::get(&self.endpoint)
            .set("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .call()
            .map_err(|e| LocationError::PositionUnavailable(e.to_string()))?;

        let r: IpApiResult = response
            .into_json()
            .map_err(|e| LocationError::PositionUnavailable(e.to_string()))?;

        let lat = r.latitude.ok_or_else(|| LocationError::PositionUnavailable("no latitude".into()))?;
        let lon = r.longitude.ok_or_else(|| LocationError::PositionUnavailable("no longitude".into()))?;
        Coordinate::new(lat, lon).map_err(|e| LocationError::PositionUnavailable(e.to_string()))
    }
}
