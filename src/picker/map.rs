//! Map capability consumed by the picker.
//!
//! The picker only needs to centre the map, keep a single marker, hear about
//! clicks and release the surface. [`HeadlessMap`] implements that in
//! process; a real widget binding implements [`MapSurface`] the same way.

use crate::location::Coordinate;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, PoisonError};

pub type ClickHandler = Box<dyn FnMut(Coordinate) + Send>;

pub const DEFAULT_ZOOM: u8 = 13;
pub const MAX_ZOOM: u8 = 18;

pub trait MapSurface: Send {
    fn set_center(&mut self, center: Coordinate, zoom: u8);
    /// Replace the single marker; `None` removes it.
    fn set_marker(&mut self, marker: Option<Coordinate>);
    fn on_click(&mut self, handler: ClickHandler);
    /// Detach and release everything. Later calls are no-ops.
    fn dispose(&mut self);
}

// ─── Tiles ──────────────────────────────────────────────────────

pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Web-Mercator limit; tiles do not cover the poles.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// An XYZ tile source.
#[derive(Debug, Clone)]
pub struct TileSource {
    template: String,
}

impl Default for TileSource {
    fn default() -> Self {
        Self::new(OSM_TILE_URL)
    }
}

impl TileSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Tile column/row containing `coordinate` at `zoom`.
    pub fn tile_index(coordinate: Coordinate, zoom: u8) -> (u32, u32) {
        let zoom = zoom.min(MAX_ZOOM);
        let n = f64::from(1u32 << zoom);
        let lat = coordinate.latitude.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();

        let x = ((coordinate.longitude + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n).floor();

        let max = n - 1.0;
        (x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
    }

    pub fn url(&self, coordinate: Coordinate, zoom: u8) -> String {
        let (x, y) = Self::tile_index(coordinate, zoom);
        self.template
            .replace("{z}", &zoom.min(MAX_ZOOM).to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

// ─── Headless surface ───────────────────────────────────────────

#[derive(Default)]
struct MapInner {
    center: Option<Coordinate>,
    zoom: u8,
    marker: Option<Coordinate>,
    handler: Option<ClickHandler>,
    disposed: bool,
}

/// In-process map surface. Clones share the same map.
#[derive(Clone, Default)]
pub struct HeadlessMap {
    inner: Arc<Mutex<MapInner>>,
    tiles: TileSource,
}

impl HeadlessMap {
    pub fn new(tiles: TileSource) -> Self {
        Self {
            inner: Arc::default(),
            tiles,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut MapInner) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }

    /// Simulate a user click. Returns `false` if nobody is listening.
    pub fn click(&self, coordinate: Coordinate) -> bool {
        let handler = self.with(|m| if m.disposed { None } else { m.handler.take() });
        let Some(mut handler) = handler else {
            return false;
        };
        handler(coordinate);
        self.with(|m| {
            if !m.disposed && m.handler.is_none() {
                m.handler = Some(handler);
            }
        });
        true
    }

    pub fn center(&self) -> Option<Coordinate> {
        self.with(|m| m.center)
    }

    pub fn zoom(&self) -> u8 {
        self.with(|m| m.zoom)
    }

    pub fn marker(&self) -> Option<Coordinate> {
        self.with(|m| m.marker)
    }

    pub fn is_disposed(&self) -> bool {
        self.with(|m| m.disposed)
    }

    /// Tile under the current centre, if the map has been centred.
    pub fn preview_url(&self) -> Option<String> {
        let (center, zoom) = self.with(|m| (m.center, m.zoom));
        center.map(|c| self.tiles.url(c, zoom))
    }
}

impl MapSurface for HeadlessMap {
    fn set_center(&mut self, center: Coordinate, zoom: u8) {
        self.with(|m| {
            if !m.disposed {
                m.center = Some(center);
                m.zoom = zoom.min(MAX_ZOOM);
            }
        });
    }

    fn set_marker(&mut self, marker: Option<Coordinate>) {
        self.with(|m| {
            if !m.disposed {
                m.marker = marker;
            }
        });
    }

    fn on_click(&mut self, handler: ClickHandler) {
        self.with(|m| {
            if !m.disposed {
                m.handler = Some(handler);
            }
        });
    }

    fn dispose(&mut self) {
        self.with(|m| {
            m.disposed = true;
            m.handler = None;
            m.marker = None;
        });
    }
}
