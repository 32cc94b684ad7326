//! Straight-line walking estimate between two points.
//!
//! There is no road network here: the route is the segment between origin
//! and destination, and duration assumes a constant walking speed.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::geometry::{planar_distance_km, LatLon};

/// A walking estimate. Only [`estimate`] builds one, so distance, duration
/// and geometry always come from the same computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEstimate {
    origin: LatLon,
    destination: LatLon,
    distance_km: f64,
    duration_minutes: u32,
    geometry: Vec<LatLon>,
}

impl RouteEstimate {
    pub fn origin(&self) -> LatLon {
        self.origin
    }

    pub fn destination(&self) -> LatLon {
        self.destination
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    /// Whole minutes, never below 1.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Polyline for rendering; at least two points.
    pub fn geometry(&self) -> &[LatLon] {
        &self.geometry
    }
}

impl fmt::Display for RouteEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} km, {} min", self.distance_km, self.duration_minutes)
    }
}

/// Estimate a walk from `origin` to `destination`.
///
/// `duration = max(1, ceil(distance / speed * 60))` minutes. A zero-length
/// route still reports one minute.
pub fn estimate(origin: LatLon, destination: LatLon, walking_speed_kmh: f64) -> Result<RouteEstimate> {
    if !walking_speed_kmh.is_finite() || walking_speed_kmh <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "walking_speed_kmh",
            reason: format!("must be finite and positive, got {}", walking_speed_kmh),
        });
    }

    let distance_km = planar_distance_km(origin, destination)?;
    let minutes = (distance_km / walking_speed_kmh * 60.0).ceil().max(1.0);

    Ok(RouteEstimate {
        origin,
        destination,
        distance_km,
        // `as` saturates, so an absurd distance cannot wrap around.
        duration_minutes: minutes as u32,
        geometry: vec![origin, destination],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_km_north_at_walking_speed() {
        let r = estimate(LatLon::new(0.0, 0.0), LatLon::new(0.009, 0.0), 5.0).unwrap();
        assert!((r.distance_km() - 1.0).abs() < 0.01);
        assert_eq!(r.duration_minutes(), 12);
        assert_eq!(r.geometry(), &[LatLon::new(0.0, 0.0), LatLon::new(0.009, 0.0)]);
    }

    #[test]
    fn test_one_km_east_matches_north() {
        let north = estimate(LatLon::new(0.0, 0.0), LatLon::new(0.009, 0.0), 5.0).unwrap();
        let east = estimate(LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.009), 5.0).unwrap();
        assert_eq!(north.distance_km(), east.distance_km());
        assert_eq!(north.duration_minutes(), east.duration_minutes());
    }

    #[test]
    fn test_zero_distance_is_one_minute() {
        let p = LatLon::new(-0.748, 37.15);
        let r = estimate(p, p, 5.0).unwrap();
        assert_eq!(r.distance_km(), 0.0);
        assert_eq!(r.duration_minutes(), 1);
        assert_eq!(r.geometry().len(), 2);
    }

    #[test]
    fn test_short_walk_rounds_up() {
        // ~111 m at 5 km/h is 1.33 min.
        let r = estimate(LatLon::new(0.0, 0.0), LatLon::new(0.001, 0.0), 5.0).unwrap();
        assert_eq!(r.duration_minutes(), 2);
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let err = estimate(LatLon::new(f64::NAN, 0.0), LatLon::new(0.0, 0.0), 5.0);
        assert!(matches!(err, Err(Error::InvalidCoordinate { .. })));
        let err = estimate(LatLon::new(0.0, 0.0), LatLon::new(0.0, f64::NEG_INFINITY), 5.0);
        assert!(matches!(err, Err(Error::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_bad_speed_rejected() {
        let a = LatLon::new(0.0, 0.0);
        for speed in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                estimate(a, a, speed),
                Err(Error::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_display() {
        let r = estimate(LatLon::new(0.0, 0.0), LatLon::new(0.009, 0.0), 5.0).unwrap();
        assert_eq!(r.to_string(), "1.00 km, 12 min");
    }
}
