//! Planar distance from storm positions to the risk-zone boundary.
//!
//! Both the boundary and the evaluated points are projected into an
//! azimuthal equidistant plane centered on the boundary before measuring,
//! so distances in the monitoring radius (a few hundred km) stay accurate.
//! Distance is the minimum to any boundary edge, zero inside the polygon.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::track::TrackPoint;

/// Mean earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeometryError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate {
                lat: latitude,
                lon: longitude,
            });
        }
        if latitude.abs() > 89.9 {
            return Err(GeometryError::LatitudeOutOfRange(latitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Planar (x, y) position in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlanarPoint {
    x: f64,
    y: f64,
}

/// The fixed at-risk administrative polygon, pre-projected at
/// construction. Read-only for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct Boundary {
    ring: Vec<GeoPoint>,
    center: GeoPoint,
    projected: Vec<PlanarPoint>,
}

impl Boundary {
    /// Builds a boundary from a closed or open exterior ring (the
    /// closing vertex is optional and deduplicated).
    pub fn new(mut ring: Vec<GeoPoint>) -> Result<Self, GeometryError> {
        if ring.len() >= 2 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(GeometryError::DegenerateBoundary(ring.len()));
        }
        for p in &ring {
            GeoPoint::new(p.latitude, p.longitude)?;
        }

        let n = ring.len() as f64;
        let center = GeoPoint {
            latitude: ring.iter().map(|p| p.latitude).sum::<f64>() / n,
            longitude: ring.iter().map(|p| p.longitude).sum::<f64>() / n,
        };
        let projected = ring.iter().map(|p| project(center, *p)).collect();

        Ok(Self {
            ring,
            center,
            projected,
        })
    }

    /// The exterior ring as provided (unclosed).
    #[must_use]
    pub fn ring(&self) -> &[GeoPoint] {
        &self.ring
    }

    /// Minimum distance in km from a point to the boundary. Zero when
    /// the point lies inside the polygon.
    pub fn distance_km(&self, point: GeoPoint) -> Result<f64, GeometryError> {
        let point = GeoPoint::new(point.latitude, point.longitude)?;
        let p = project(self.center, point);

        if self.contains_planar(p) {
            return Ok(0.0);
        }

        let mut min_sq = f64::INFINITY;
        for i in 0..self.projected.len() {
            let a = self.projected[i];
            let b = self.projected[(i + 1) % self.projected.len()];
            let d = point_segment_sq(p, a, b);
            if d < min_sq {
                min_sq = d;
            }
        }
        Ok(min_sq.sqrt() / 1000.0)
    }

    /// Distances in km for every point of a track, in track order.
    pub fn track_distances_km(&self, points: &[TrackPoint]) -> Result<Vec<f64>, GeometryError> {
        points
            .iter()
            .map(|p| {
                self.distance_km(GeoPoint {
                    latitude: p.latitude,
                    longitude: p.longitude,
                })
            })
            .collect()
    }

    /// Even-odd ray casting in the projected plane.
    fn contains_planar(&self, p: PlanarPoint) -> bool {
        let mut inside = false;
        let n = self.projected.len();
        let mut j = n - 1;
        for i in 0..n {
            let a = self.projected[i];
            let b = self.projected[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Azimuthal equidistant forward projection centered on `center`.
fn project(center: GeoPoint, p: GeoPoint) -> PlanarPoint {
    let lat0 = center.latitude.to_radians();
    let lon0 = center.longitude.to_radians();
    let lat = p.latitude.to_radians();
    let lon = p.longitude.to_radians();

    let cos_c = lat0.sin() * lat.sin() + lat0.cos() * lat.cos() * (lon - lon0).cos();
    let c = cos_c.clamp(-1.0, 1.0).acos();
    // c/sin(c) -> 1 at the projection center.
    let k = if c.abs() < 1e-12 { 1.0 } else { c / c.sin() };

    PlanarPoint {
        x: EARTH_RADIUS_M * k * lat.cos() * (lon - lon0).sin(),
        y: EARTH_RADIUS_M
            * k
            * (lat0.cos() * lat.sin() - lat0.sin() * lat.cos() * (lon - lon0).cos()),
    }
}

/// Squared distance from `p` to segment `ab` in the projected plane.
fn point_segment_sq(p: PlanarPoint, a: PlanarPoint, b: PlanarPoint) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;

    let t = if len_sq <= 0.0 {
        0.0
    } else {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0)
    };

    let cx = a.x + t * abx;
    let cy = a.y + t * aby;
    let dx = p.x - cx;
    let dy = p.y - cy;
    dx * dx + dy * dy
}
