//! Error types shared across the room finder core.
//!
//! Record-level validation problems live in [`crate::catalog::RecordError`]
//! because they are recovered locally (the record is dropped). Everything
//! here is propagated to the caller.

use thiserror::Error;

/// Errors returned by geometry, routing, readiness and configuration code.
#[derive(Debug, Error)]
pub enum Error {
    /// A coordinate was NaN or infinite.
    #[error("invalid coordinate ({lat}, {lon}): latitude and longitude must be finite")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// A geometry operation received no points.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// A numeric parameter was out of range (e.g. zero walking speed).
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The map surface never signalled readiness within the retry budget.
    #[error("map surface unavailable after {attempts} readiness checks")]
    ResourceUnavailable { attempts: u32 },

    /// The controller was disposed while an operation was pending.
    #[error("map controller disposed")]
    Disposed,

    /// A configuration or data document failed to parse.
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
