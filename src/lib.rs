//! Location picker for notes.
//!
//! Picks a coordinate (device geolocation, map click or a default fallback),
//! reverse-geocodes it into a place name and attaches it to a note through
//! the host application's extension points.

pub mod config;
pub mod host;
pub mod i18n;
pub mod location;
pub mod picker;
pub mod server;
