//! User position and the geolocation collaborator.
//!
//! The core never invents a position. When the provider fails, [`locate`]
//! returns `None` and the caller decides on a fallback (e.g. campus centre).

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::LatLon;

/// A GPS fix. `seq` increases with every fix so stale updates arriving out
/// of order can be recognised and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub position: LatLon,
    pub seq: u64,
}

impl UserLocation {
    pub fn new(lat: f64, lon: f64, seq: u64) -> Self {
        Self {
            position: LatLon::new(lat, lon),
            seq,
        }
    }

    /// True if `self` should replace `previous`.
    pub fn supersedes(&self, previous: &UserLocation) -> bool {
        self.seq >= previous.seq
    }
}

/// Why a position could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("location request timed out")]
    Timeout,
}

/// Single-shot position source (browser geolocation, a GPS daemon, a fake).
pub trait GeolocationProvider {
    fn current_position(&mut self) -> impl Future<Output = Result<UserLocation, LocationError>>;
}

/// Ask the provider once. No retry: failure simply means "no location".
pub async fn locate<P: GeolocationProvider>(provider: &mut P) -> Option<UserLocation> {
    match provider.current_position().await {
        Ok(fix) if fix.position.is_finite() => Some(fix),
        Ok(fix) => {
            log::warn!(
                "Ignoring non-finite position fix ({}, {})",
                fix.position.lat,
                fix.position.lon
            );
            None
        }
        Err(e) => {
            log::info!("No user location: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<UserLocation, LocationError>);

    impl GeolocationProvider for Fixed {
        async fn current_position(&mut self) -> Result<UserLocation, LocationError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_locate_success() {
        let mut p = Fixed(Ok(UserLocation::new(-0.748, 37.15, 1)));
        assert_eq!(locate(&mut p).await, Some(UserLocation::new(-0.748, 37.15, 1)));
    }

    #[tokio::test]
    async fn test_locate_failure_is_none() {
        let mut denied = Fixed(Err(LocationError::PermissionDenied));
        assert_eq!(locate(&mut denied).await, None);
        let mut timeout = Fixed(Err(LocationError::Timeout));
        assert_eq!(locate(&mut timeout).await, None);
    }

    #[tokio::test]
    async fn test_locate_rejects_nan_fix() {
        let mut p = Fixed(Ok(UserLocation::new(f64::NAN, 37.15, 1)));
        assert_eq!(locate(&mut p).await, None);
    }

    #[test]
    fn test_supersedes() {
        let a = UserLocation::new(0.0, 0.0, 4);
        let b = UserLocation::new(0.0, 1.0, 5);
        assert!(b.supersedes(&a));
        assert!(!a.supersedes(&b));
        assert!(a.supersedes(&a));
    }
}
