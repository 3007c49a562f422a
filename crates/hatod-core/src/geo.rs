//! Coordinate validation and great-circle distance math.
//!
//! Every discovery entry point validates its origin coordinate here before
//! touching the store or the routing API; an invalid coordinate fails fast
//! instead of flowing downstream as a silent zero distance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees (WGS84).
///
/// Constructed through [`Coordinate::new`], which enforces the range and
/// finiteness invariants. Deserialized values must be re-validated by the
/// consumer before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// The coordinate failed range or finiteness validation.
#[derive(Debug, Clone, Copy, Error)]
#[error("invalid coordinates: lat={latitude}, lng={longitude}")]
pub struct InvalidCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinates`] if either component is NaN, infinite,
    /// or outside `[-90, 90]` / `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        if Self::validate(latitude, longitude) {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(InvalidCoordinates {
                latitude,
                longitude,
            })
        }
    }

    /// Returns `true` iff `lat ∈ [-90, 90]`, `lng ∈ [-180, 180]`, and both
    /// are finite.
    #[must_use]
    pub fn validate(latitude: f64, longitude: f64) -> bool {
        latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
    }
}

/// Great-circle distance between two points in meters (haversine formula).
///
/// Ignores the road network entirely; used only as the checkout-path
/// fallback when routed distance resolution fails.
#[must_use]
pub fn haversine_meters(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_in_range_coordinates() {
        assert!(Coordinate::validate(14.5995, 120.9842));
        assert!(Coordinate::validate(-90.0, -180.0));
        assert!(Coordinate::validate(90.0, 180.0));
        assert!(Coordinate::validate(0.0, 0.0));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(!Coordinate::validate(90.01, 0.0));
        assert!(!Coordinate::validate(-90.01, 0.0));
        assert!(!Coordinate::validate(0.0, 180.01));
        assert!(!Coordinate::validate(0.0, -180.01));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        assert!(!Coordinate::validate(f64::NAN, 0.0));
        assert!(!Coordinate::validate(0.0, f64::NAN));
        assert!(!Coordinate::validate(f64::INFINITY, 0.0));
        assert!(!Coordinate::validate(0.0, f64::NEG_INFINITY));
    }

    #[test]
    fn new_fails_fast_on_invalid_input() {
        let err = Coordinate::new(200.0, 0.0).unwrap_err();
        assert!((err.latitude - 200.0).abs() < f64::EPSILON);
        assert!(Coordinate::new(14.5995, 120.9842).is_ok());
    }

    #[test]
    fn haversine_manila_to_quezon_city() {
        // Manila city hall to Quezon City circle: roughly 10–12 km.
        let manila = Coordinate::new(14.5995, 120.9842).unwrap();
        let qc = Coordinate::new(14.6515, 121.0493).unwrap();
        let d = haversine_meters(manila, qc);
        assert!(d > 8_000.0 && d < 12_000.0, "got {d}");
    }

    #[test]
    fn haversine_is_zero_for_identical_points() {
        let p = Coordinate::new(14.5995, 120.9842).unwrap();
        assert!(haversine_meters(p, p).abs() < 1e-6);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = Coordinate::new(14.5995, 120.9842).unwrap();
        let b = Coordinate::new(10.3157, 123.8854).unwrap();
        let ab = haversine_meters(a, b);
        let ba = haversine_meters(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }
}
