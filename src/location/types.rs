//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A latitude/longitude pair in degrees.
///
/// Always within bounds when built through [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::InvalidCoordinate {
                lat: latitude,
                lon: longitude,
            });
        }
        Ok(Self { latitude, longitude })
    }

    /// Latitude and longitude rounded to 4 decimals, as used in labels.
    pub fn rounded(&self) -> (String, String) {
        (format!("{:.4}", self.latitude), format!("{:.4}", self.longitude))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lat, lon) = self.rounded();
        write!(f, "{}, {}", lat, lon)
    }
}

/// A named place as stored on a note.
///
/// Serialized with exactly the keys `name`, `lat`, `lng`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl PlaceInfo {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            lat: coordinate.latitude,
            lng: coordinate.longitude,
        }
    }

    /// The "no location" value written when a location is removed from a note.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            lat: 0.0,
            lng: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.lat == 0.0 && self.lng == 0.0
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.lat, self.lng).ok()
    }

    /// Read a place out of a note metadata object. Missing keys yield `None`.
    pub fn from_metadata(metadata: &Map<String, Value>) -> Option<Self> {
        let name = metadata.get("name")?.as_str()?.to_string();
        let lat = metadata.get("lat").and_then(Value::as_f64).unwrap_or(0.0);
        let lng = metadata.get("lng").and_then(Value::as_f64).unwrap_or(0.0);
        Some(Self { name, lat, lng })
    }

    /// Write `name`, `lat`, `lng` into a metadata object, keeping other keys.
    pub fn write_into(&self, metadata: &mut Map<String, Value>) {
        metadata.insert("name".into(), Value::from(self.name.clone()));
        metadata.insert("lat".into(), Value::from(self.lat));
        metadata.insert("lng".into(), Value::from(self.lng));
    }
}

/// Structured address fields pulled out of a geocoding response.
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressComponents {
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub road: Option<String>,
    pub house_number: Option<String>,
}

/// Location workflow errors. None of them are fatal; each has a fallback.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("geolocation is not supported on this platform")]
    UnsupportedPlatform,
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("reverse geocoding unavailable: {0}")]
    GeocodeUnavailable(String),
    #[error("invalid coordinate: lat {lat}, lon {lon} (lat -90..90, lon -180..180)")]
    InvalidCoordinate { lat: f64, lon: f64 },
}
