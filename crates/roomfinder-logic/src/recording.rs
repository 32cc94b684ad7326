//! A [`MapSurface`] that draws nothing and remembers everything.
//!
//! Used by unit tests, integration tests and the simtest harness to check
//! layer lifecycle rules: how many layers are live, which calls were made,
//! and whether any handle was touched after removal.

use std::cell::Cell;
use std::collections::BTreeMap;

use crate::geometry::{Bounds, LatLon};
use crate::styles::TileStyle;
use crate::surface::{LineStyle, MapSurface, MarkerVisual, PolygonStyle};

/// Kind of layer behind a recorded handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Base,
    Marker,
    Line,
    Polygon,
}

/// One call made against the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    CreateBase { handle: u64, style: String },
    CreateMarker { handle: u64, at: LatLon, tooltip: String },
    UpdateMarker { handle: u64, at: LatLon },
    Remove { handle: u64 },
    CreateLine { handle: u64, points: usize },
    CreatePolygon { handle: u64, vertices: usize },
    FitBounds { bounds: Bounds, padding: u32 },
    PanTo { at: LatLon },
}

impl SurfaceCall {
    /// Calls that change which layers exist or where they are.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, SurfaceCall::FitBounds { .. } | SurfaceCall::PanTo { .. })
    }
}

#[derive(Debug, Clone)]
struct LiveLayer {
    kind: LayerKind,
    position: Option<LatLon>,
}

/// Recording test double. Starts not ready.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ready: bool,
    next_handle: u64,
    live: BTreeMap<u64, LiveLayer>,
    calls: Vec<SurfaceCall>,
    violations: Vec<String>,
    readiness_checks: Cell<u32>,
    /// Become ready after this many `is_ready` checks, if set.
    ready_after_checks: Option<u32>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that is ready from the start.
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    /// A surface that reports ready on the `n`-th readiness check.
    pub fn ready_after(n: u32) -> Self {
        Self {
            ready_after_checks: Some(n),
            ..Self::default()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of layer-changing calls recorded so far.
    pub fn mutation_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_mutation()).count()
    }

    pub fn live_layer_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_count(&self, kind: LayerKind) -> usize {
        self.live.values().filter(|l| l.kind == kind).count()
    }

    /// Markers currently shown with the given tooltip.
    pub fn markers_with_tooltip(&self, tooltip: &str) -> usize {
        let live_ids: Vec<u64> = self
            .calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::CreateMarker { handle, tooltip: t, .. } if t == tooltip => {
                    Some(*handle)
                }
                _ => None,
            })
            .collect();
        live_ids.iter().filter(|h| self.live.contains_key(h)).count()
    }

    pub fn position_of(&self, handle: u64) -> Option<LatLon> {
        self.live.get(&handle).and_then(|l| l.position)
    }

    /// Lifecycle violations: updates or removals of handles that are not live.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn readiness_checks(&self) -> u32 {
        self.readiness_checks.get()
    }

    fn allocate(&mut self, kind: LayerKind, position: Option<LatLon>) -> u64 {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.live.insert(handle, LiveLayer { kind, position });
        handle
    }
}

impl MapSurface for RecordingSurface {
    type Handle = u64;

    fn is_ready(&self) -> bool {
        let checks = self.readiness_checks.get() + 1;
        self.readiness_checks.set(checks);
        self.ready || self.ready_after_checks.is_some_and(|n| checks >= n)
    }

    fn create_base_layer(&mut self, style: &TileStyle) -> u64 {
        let handle = self.allocate(LayerKind::Base, None);
        self.calls.push(SurfaceCall::CreateBase {
            handle,
            style: style.key.clone(),
        });
        handle
    }

    fn create_marker(&mut self, at: LatLon, visual: &MarkerVisual) -> u64 {
        let handle = self.allocate(LayerKind::Marker, Some(at));
        self.calls.push(SurfaceCall::CreateMarker {
            handle,
            at,
            tooltip: visual.tooltip.clone(),
        });
        handle
    }

    fn update_marker_position(&mut self, handle: &u64, at: LatLon) {
        match self.live.get_mut(handle) {
            Some(layer) if layer.kind == LayerKind::Marker => layer.position = Some(at),
            Some(layer) => self
                .violations
                .push(format!("update on non-marker layer #{} ({:?})", handle, layer.kind)),
            None => self
                .violations
                .push(format!("update on dead handle #{}", handle)),
        }
        self.calls.push(SurfaceCall::UpdateMarker {
            handle: *handle,
            at,
        });
    }

    fn remove_layer(&mut self, handle: u64) {
        if self.live.remove(&handle).is_none() {
            self.violations
                .push(format!("remove of dead handle #{}", handle));
        }
        self.calls.push(SurfaceCall::Remove { handle });
    }

    fn create_line_overlay(&mut self, geometry: &[LatLon], _style: &LineStyle) -> u64 {
        let handle = self.allocate(LayerKind::Line, None);
        self.calls.push(SurfaceCall::CreateLine {
            handle,
            points: geometry.len(),
        });
        handle
    }

    fn create_polygon_overlay(&mut self, ring: &[LatLon], _style: &PolygonStyle) -> u64 {
        let handle = self.allocate(LayerKind::Polygon, None);
        self.calls.push(SurfaceCall::CreatePolygon {
            handle,
            vertices: ring.len(),
        });
        handle
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32) {
        self.calls.push(SurfaceCall::FitBounds { bounds, padding });
    }

    fn pan_to(&mut self, at: LatLon) {
        self.calls.push(SurfaceCall::PanTo { at });
    }
}
