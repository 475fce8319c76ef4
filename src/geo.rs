//! Geographic coordinates, bounding boxes and the Web Mercator projection.

use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::{EARTH_RADIUS_M, TILE_SIZE_PX};

/// Latitude limit of the Web Mercator projection
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in meters
    pub fn distance_to(&self, other: &LatLon) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Bit-exact key for use in hash maps
    pub fn key(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

/// An axis-aligned box in latitude/longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: LatLon,
    pub max: LatLon,
}

impl BoundingBox {
    pub fn new(min: LatLon, max: LatLon) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all `points`, or `None` if there are none
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a LatLon>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.min.latitude = bounds.min.latitude.min(p.latitude);
            bounds.min.longitude = bounds.min.longitude.min(p.longitude);
            bounds.max.latitude = bounds.max.latitude.max(p.latitude);
            bounds.max.longitude = bounds.max.longitude.max(p.longitude);
        }
        Some(bounds)
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min.latitude + self.max.latitude) / 2.0,
            (self.min.longitude + self.max.longitude) / 2.0,
        )
    }

    pub fn corners(&self) -> [LatLon; 4] {
        [
            self.min,
            LatLon::new(self.min.latitude, self.max.longitude),
            self.max,
            LatLon::new(self.max.latitude, self.min.longitude),
        ]
    }
}

/// Edge length of the whole world in pixels at the given zoom
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE_PX * 2f64.powf(zoom)
}

/// Project a coordinate to Web Mercator pixels at the given zoom (origin top left)
pub fn to_world(pos: &LatLon, zoom: f64) -> DVec2 {
    let size = world_size(zoom);
    let lat = pos
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = (pos.longitude + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0;
    DVec2::new(x * size, y * size)
}

/// Inverse of [`to_world`]. Returns `None` for points outside the projected world.
pub fn from_world(world: DVec2, zoom: f64) -> Option<LatLon> {
    let size = world_size(zoom);
    let y = world.y / size;
    if !(0.0..=1.0).contains(&y) {
        return None;
    }
    let n = std::f64::consts::PI * (1.0 - 2.0 * y);
    let latitude = n.sinh().atan().to_degrees();
    // Wrap longitude into [-180, 180)
    let longitude = (world.x / size * 360.0 + 180.0).rem_euclid(360.0) - 180.0;
    Some(LatLon::new(latitude, longitude))
}
