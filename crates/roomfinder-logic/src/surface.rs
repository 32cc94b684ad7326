//! The map rendering surface the controller drives but does not own.
//!
//! Any slippy-map backend (a Leaflet bridge, a native tile renderer, the
//! [`crate::recording::RecordingSurface`] test double) implements
//! [`MapSurface`]. The controller only ever talks to this trait.

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, LatLon};
use crate::styles::TileStyle;

/// Colour and icon of a point marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: String,
    pub icon: String,
}

impl MarkerStyle {
    pub fn new(color: &str, icon: &str) -> Self {
        Self {
            color: color.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Everything a marker shows: icon style plus hover/click text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerVisual {
    pub style: MarkerStyle,
    pub tooltip: String,
    pub popup: Option<String>,
}

/// Stroke for polylines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: String,
    pub weight: f32,
    pub opacity: f32,
    /// Dash pattern such as `"10, 5"`; `None` for a solid line.
    pub dash: Option<String>,
}

/// Stroke and fill for polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    pub stroke_color: String,
    pub stroke_weight: f32,
    pub fill_color: String,
    pub fill_opacity: f32,
}

/// Primitive operations on an externally owned interactive map.
///
/// Handles are opaque to the controller. A handle passed to
/// [`MapSurface::remove_layer`] is consumed and never used again.
pub trait MapSurface {
    type Handle: Clone + std::fmt::Debug;

    /// Whether the surface has finished initialising and accepts layers.
    fn is_ready(&self) -> bool;

    fn create_base_layer(&mut self, style: &TileStyle) -> Self::Handle;
    fn create_marker(&mut self, at: LatLon, visual: &MarkerVisual) -> Self::Handle;
    fn update_marker_position(&mut self, handle: &Self::Handle, at: LatLon);
    fn remove_layer(&mut self, handle: Self::Handle);
    fn create_line_overlay(&mut self, geometry: &[LatLon], style: &LineStyle) -> Self::Handle;
    fn create_polygon_overlay(&mut self, ring: &[LatLon], style: &PolygonStyle) -> Self::Handle;

    /// Re-fit the viewport so `bounds` is visible with `padding` pixels spare.
    fn fit_bounds(&mut self, bounds: Bounds, padding: u32);
    /// Re-centre without changing zoom.
    fn pan_to(&mut self, at: LatLon);
}
