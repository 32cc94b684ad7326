//! Campus boundary and the location-based access gate.
//!
//! The gate only decides. Blocking the UI, showing a banner or falling
//! back to a default position is up to the caller.
//!
//! # Fail-open
//!
//! A boundary with fewer than three distinct vertices cannot enclose
//! anything. Rather than lock everyone out over bad boundary data, the gate
//! then allows every location and the boundary reports a warning.
//!
//! ```
//! use roomfinder_logic::access::{check, AccessDecision, CampusBoundary, DenialReason};
//! use roomfinder_logic::geometry::LatLon;
//!
//! let boundary = CampusBoundary::new(vec![
//!     LatLon::new(0.0, 0.0),
//!     LatLon::new(0.0, 10.0),
//!     LatLon::new(10.0, 10.0),
//!     LatLon::new(10.0, 0.0),
//! ]);
//! assert!(check(LatLon::new(5.0, 5.0), &boundary).is_allowed());
//! assert_eq!(
//!     check(LatLon::new(20.0, 20.0), &boundary),
//!     AccessDecision::Denied(DenialReason::OutsideBoundary)
//! );
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{bounds_of, open_ring, point_in_polygon, Bounds, LatLon};
use crate::location::UserLocation;

/// Campus outline, closed explicitly or implicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampusBoundary {
    vertices: Vec<LatLon>,
}

impl CampusBoundary {
    /// Build from an ordered vertex list. An explicit closing vertex
    /// (equal to the first) is dropped. Non-finite vertices are skipped.
    pub fn new(vertices: Vec<LatLon>) -> Self {
        let finite: Vec<LatLon> = vertices.into_iter().filter(LatLon::is_finite).collect();
        let vertices = open_ring(&finite).to_vec();
        let boundary = Self { vertices };
        if let Some(w) = boundary.warning() {
            log::warn!("{}", w);
        }
        boundary
    }

    /// Parse a JSON array of `{"lat": .., "lon": ..}` objects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let vertices: Vec<LatLon> = serde_json::from_str(json)?;
        Ok(Self::new(vertices))
    }

    pub fn vertices(&self) -> &[LatLon] {
        &self.vertices
    }

    fn distinct_vertex_count(&self) -> usize {
        let mut distinct: Vec<LatLon> = Vec::with_capacity(self.vertices.len());
        for v in &self.vertices {
            if !distinct.contains(v) {
                distinct.push(*v);
            }
        }
        distinct.len()
    }

    /// Whether the boundary can actually be checked against.
    pub fn is_enforceable(&self) -> bool {
        self.distinct_vertex_count() >= 3
    }

    /// Configuration warning to surface when checks are disabled.
    pub fn warning(&self) -> Option<String> {
        if self.is_enforceable() {
            None
        } else {
            Some(format!(
                "Campus boundary has {} distinct vertices (need 3); access checks disabled",
                self.distinct_vertex_count()
            ))
        }
    }

    /// Bounding box of the outline, `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        bounds_of(&self.vertices).ok()
    }
}

/// Why the gate said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    OutsideBoundary,
    /// No position fix, or a non-finite one.
    LocationUnavailable,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::OutsideBoundary => write!(f, "outside campus boundary"),
            DenialReason::LocationUnavailable => write!(f, "location unavailable"),
        }
    }
}

/// Result of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDecision {
    /// `fail_open` is set when the boundary was unusable and nothing was checked.
    Allowed { fail_open: bool },
    Denied(DenialReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed { .. })
    }
}

/// Decide whether `position` may use the service.
pub fn check(position: LatLon, boundary: &CampusBoundary) -> AccessDecision {
    if !boundary.is_enforceable() {
        return AccessDecision::Allowed { fail_open: true };
    }
    if !position.is_finite() {
        return AccessDecision::Denied(DenialReason::LocationUnavailable);
    }
    if point_in_polygon(position, boundary.vertices()) {
        AccessDecision::Allowed { fail_open: false }
    } else {
        AccessDecision::Denied(DenialReason::OutsideBoundary)
    }
}

/// Like [`check`], but for a fix that may be missing.
pub fn check_fix(fix: Option<&UserLocation>, boundary: &CampusBoundary) -> AccessDecision {
    match fix {
        Some(loc) => check(loc.position, boundary),
        None if !boundary.is_enforceable() => AccessDecision::Allowed { fail_open: true },
        None => AccessDecision::Denied(DenialReason::LocationUnavailable),
    }
}
