//! Pure room-discovery logic for Campus Room Finder.
//!
//! This crate contains everything the finder does that is independent of a
//! browser, a tile engine or a UI toolkit. Functions take plain data and
//! return results, so the same code runs in unit tests, the simtest CLI and
//! whatever front end drives a real map.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`access`] | Campus boundary and the location-based access gate |
//! | [`catalog`] | Room records: loading, validation, lookup by id |
//! | [`config`] | Finder configuration, defaults and validation |
//! | [`error`] | Crate-wide error type |
//! | [`geometry`] | Coordinates, point-in-polygon, planar distance, bounds |
//! | [`location`] | User position fixes and the geolocation provider seam |
//! | [`map_sync`] | Reconciles application state onto an external map |
//! | [`readiness`] | Bounded polling for surface readiness, cancellable on dispose |
//! | [`recording`] | Recording [`surface::MapSurface`] for tests and the simtest harness |
//! | [`route`] | Straight-line walking distance and duration |
//! | [`search`] | Substring and fuzzy room search, suggestions, featured rooms |
//! | [`styles`] | Base-map tile style table |
//! | [`surface`] | The map surface trait and layer styling |

pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod location;
pub mod map_sync;
pub mod readiness;
pub mod recording;
pub mod route;
pub mod search;
pub mod styles;
pub mod surface;

pub use error::{Error, Result};
