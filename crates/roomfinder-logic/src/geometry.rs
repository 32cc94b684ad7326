//! Planar geometry over latitude/longitude pairs.
//!
//! Everything here treats coordinates as points on a flat plane. That is
//! good enough for a campus a few hundred metres across and keeps the
//! math deterministic; it is not a geodesic library.
//!
//! ```
//! use roomfinder_logic::geometry::{point_in_polygon, LatLon};
//!
//! let square = [
//!     LatLon::new(0.0, 0.0),
//!     LatLon::new(0.0, 10.0),
//!     LatLon::new(10.0, 10.0),
//!     LatLon::new(10.0, 0.0),
//! ];
//! assert!(point_in_polygon(LatLon::new(5.0, 5.0), &square));
//! assert!(!point_in_polygon(LatLon::new(20.0, 20.0), &square));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Metres covered by one degree, applied to both axes.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Reject NaN/infinite coordinates instead of letting them leak into math.
    pub fn ensure_finite(&self) -> Result<()> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}

/// Axis-aligned bounding box. `min` holds the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: LatLon,
    pub max: LatLon,
}

impl Bounds {
    /// The whole globe. Used as the permissive default envelope.
    pub const WORLD: Bounds = Bounds {
        min: LatLon::new(-90.0, -180.0),
        max: LatLon::new(90.0, 180.0),
    };

    /// Inclusive containment test.
    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.min.lat && p.lat <= self.max.lat && p.lon >= self.min.lon && p.lon <= self.max.lon
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min.lat + self.max.lat) / 2.0,
            (self.min.lon + self.max.lon) / 2.0,
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::WORLD
    }
}

// ── Point in polygon ────────────────────────────────────────────────────

/// Even-odd ray casting with latitude as y and longitude as x.
///
/// Points lying exactly on an edge or a vertex are **inside**. A polygon
/// with fewer than three vertices (after dropping an explicit closing
/// vertex) encloses nothing and always returns `false`.
///
/// The answer depends only on the set of edges, so any cyclic rotation of
/// `polygon` gives the same result.
pub fn point_in_polygon(point: LatLon, polygon: &[LatLon]) -> bool {
    let ring = open_ring(polygon);
    let n = ring.len();
    if n < 3 || !point.is_finite() {
        return false;
    }

    let (x, y) = (point.lon, point.lat);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lon, ring[i].lat);
        let (xj, yj) = (ring[j].lon, ring[j].lat);

        if on_segment(x, y, xi, yi, xj, yj) {
            return true;
        }

        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Strip a trailing vertex that repeats the first one.
pub(crate) fn open_ring(polygon: &[LatLon]) -> &[LatLon] {
    match (polygon.first(), polygon.last()) {
        (Some(first), Some(last)) if polygon.len() > 1 && first == last => {
            &polygon[..polygon.len() - 1]
        }
        _ => polygon,
    }
}

/// Exact collinearity plus bounding-box check. No tolerance on purpose: the
/// same inputs must always give the same answer.
fn on_segment(x: f64, y: f64, xi: f64, yi: f64, xj: f64, yj: f64) -> bool {
    let cross = (xj - xi) * (y - yi) - (yj - yi) * (x - xi);
    cross == 0.0 && x >= xi.min(xj) && x <= xi.max(xj) && y >= yi.min(yj) && y <= yi.max(yj)
}

// ── Distance ────────────────────────────────────────────────────────────

/// Approximate distance in kilometres between two points.
///
/// Scales the raw degree delta by [`METERS_PER_DEGREE`] on both axes and
/// takes the Euclidean norm. Only meaningful over sub-kilometre campus
/// distances near the equator; error grows with latitude and span.
pub fn planar_distance_km(a: LatLon, b: LatLon) -> Result<f64> {
    a.ensure_finite()?;
    b.ensure_finite()?;
    let dlat = a.lat - b.lat;
    let dlon = a.lon - b.lon;
    Ok(dlat.hypot(dlon) * METERS_PER_DEGREE / 1000.0)
}

// ── Bounding boxes ──────────────────────────────────────────────────────

/// Smallest box containing every point.
pub fn bounds_of(points: &[LatLon]) -> Result<Bounds> {
    let (first, rest) = points
        .split_first()
        .ok_or(Error::EmptyInput("bounds_of needs at least one point"))?;
    first.ensure_finite()?;

    let mut bounds = Bounds {
        min: *first,
        max: *first,
    };
    for p in rest {
        p.ensure_finite()?;
        bounds.min.lat = bounds.min.lat.min(p.lat);
        bounds.min.lon = bounds.min.lon.min(p.lon);
        bounds.max.lat = bounds.max.lat.max(p.lat);
        bounds.max.lon = bounds.max.lon.max(p.lon);
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn square() -> Vec<LatLon> {
        vec![
            LatLon::new(0.0, 0.0),
            LatLon::new(0.0, 10.0),
            LatLon::new(10.0, 10.0),
            LatLon::new(10.0, 0.0),
        ]
    }

    #[test]
    fn test_inside_and_outside_square() {
        let poly = square();
        assert!(point_in_polygon(LatLon::new(5.0, 5.0), &poly));
        assert!(!point_in_polygon(LatLon::new(20.0, 20.0), &poly));
        assert!(!point_in_polygon(LatLon::new(-0.1, 5.0), &poly));
    }

    #[test]
    fn test_edges_and_vertices_are_inside() {
        let poly = square();
        assert!(point_in_polygon(LatLon::new(0.0, 5.0), &poly));
        assert!(point_in_polygon(LatLon::new(10.0, 5.0), &poly));
        assert!(point_in_polygon(LatLon::new(5.0, 10.0), &poly));
        assert!(point_in_polygon(LatLon::new(10.0, 10.0), &poly));
        assert!(point_in_polygon(LatLon::new(0.0, 0.0), &poly));
    }

    #[test]
    fn test_degenerate_polygon_is_outside() {
        let line = [LatLon::new(0.0, 0.0), LatLon::new(10.0, 10.0)];
        assert!(!point_in_polygon(LatLon::new(5.0, 5.0), &line));
        assert!(!point_in_polygon(LatLon::new(0.0, 0.0), &[]));

        // Three entries but explicitly closed: only two distinct vertices.
        let closed_line = [
            LatLon::new(0.0, 0.0),
            LatLon::new(10.0, 10.0),
            LatLon::new(0.0, 0.0),
        ];
        assert!(!point_in_polygon(LatLon::new(5.0, 5.0), &closed_line));
    }

    #[test]
    fn test_explicitly_closed_ring_matches_open_ring() {
        let open = square();
        let mut closed = open.clone();
        closed.push(open[0]);
        for p in [
            LatLon::new(5.0, 5.0),
            LatLon::new(0.0, 3.0),
            LatLon::new(11.0, 3.0),
        ] {
            assert_eq!(point_in_polygon(p, &open), point_in_polygon(p, &closed));
        }
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening north.
        let u = [
            LatLon::new(0.0, 0.0),
            LatLon::new(0.0, 9.0),
            LatLon::new(9.0, 9.0),
            LatLon::new(9.0, 6.0),
            LatLon::new(3.0, 6.0),
            LatLon::new(3.0, 3.0),
            LatLon::new(9.0, 3.0),
            LatLon::new(9.0, 0.0),
        ];
        assert!(point_in_polygon(LatLon::new(1.0, 4.5), &u));
        assert!(!point_in_polygon(LatLon::new(6.0, 4.5), &u));
        assert!(point_in_polygon(LatLon::new(6.0, 1.5), &u));
    }

    #[test]
    fn test_rotation_invariance_sweep() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.gen_range(3..9);
            let poly: Vec<LatLon> = (0..n)
                .map(|_| LatLon::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)))
                .collect();
            let p = LatLon::new(rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0));
            let expected = point_in_polygon(p, &poly);
            for shift in 1..n {
                let mut rotated = poly.clone();
                rotated.rotate_left(shift);
                assert_eq!(point_in_polygon(p, &rotated), expected);
            }
        }
    }

    #[test]
    fn test_nan_point_is_outside() {
        assert!(!point_in_polygon(LatLon::new(f64::NAN, 5.0), &square()));
    }

    #[test]
    fn test_distance_one_km_north() {
        let d = planar_distance_km(LatLon::new(0.0, 0.0), LatLon::new(0.009, 0.0)).unwrap();
        assert!((d - 0.999).abs() < 1e-9);
    }

    #[test]
    fn test_distance_symmetry_and_zero_sweep() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let a = LatLon::new(rng.gen_range(-1.0..1.0), rng.gen_range(36.0..38.0));
            let b = LatLon::new(rng.gen_range(-1.0..1.0), rng.gen_range(36.0..38.0));
            let ab = planar_distance_km(a, b).unwrap();
            let ba = planar_distance_km(b, a).unwrap();
            assert_eq!(ab, ba);
            assert!(ab >= 0.0 && !ab.is_nan());
            assert_eq!(ab == 0.0, a == b);
            assert_eq!(planar_distance_km(a, a).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_distance_rejects_non_finite() {
        let err = planar_distance_km(LatLon::new(f64::INFINITY, 0.0), LatLon::new(0.0, 0.0));
        assert!(matches!(err, Err(Error::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_bounds_of_points() {
        let b = bounds_of(&[
            LatLon::new(1.0, 5.0),
            LatLon::new(-2.0, 7.0),
            LatLon::new(0.5, 4.0),
        ])
        .unwrap();
        assert_eq!(b.min, LatLon::new(-2.0, 4.0));
        assert_eq!(b.max, LatLon::new(1.0, 7.0));
        assert!(b.contains(LatLon::new(0.0, 6.0)));
        assert_eq!(b.center(), LatLon::new(-0.5, 5.5));
    }

    #[test]
    fn test_bounds_of_empty_fails() {
        assert!(matches!(bounds_of(&[]), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn test_bounds_of_non_finite_fails() {
        let err = bounds_of(&[LatLon::new(0.0, 0.0), LatLon::new(f64::NAN, 1.0)]);
        assert!(matches!(err, Err(Error::InvalidCoordinate { .. })));
    }
}
