//! Location subsystem: coordinates, device geolocation and reverse geocoding.

pub mod address;
pub mod geocoder;
pub mod geolocation;
pub mod types;

pub use geocoder::{resolve_or_fallback, NominatimGeocoder, ReverseGeocoder};
pub use geolocation::{
    acquire_current_coordinate, FixedGeolocator, Geolocator, IpGeolocator, NoGeolocation,
    DEFAULT_COORDINATE, GEOLOCATION_TIMEOUT,
};
pub use types::{AddressComponents, Coordinate, LocationError, PlaceInfo};
