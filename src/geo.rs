//! Great-circle geometry for pickup locations
//!
//! Haversine distance and forward bearing on a spherical Earth. All functions
//! are pure and total: invalid input produces a number, never an error, so
//! callers validate coordinates with [`is_valid_coordinate`] first.

use serde::{Deserialize, Serialize};

/// Mean Earth radius (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Haversine distance to another point (km)
    pub fn distance_km_to(&self, other: &GeoPoint) -> f64 {
        distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    pub fn is_valid(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Haversine great-circle distance between two coordinates (km)
pub fn distance_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let d_lat = (lat_b - lat_a).to_radians();
    let d_lon = (lon_b - lon_a).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat_a.to_radians().cos() * lat_b.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial bearing (forward azimuth) from A to B, in degrees `[0, 360)`
pub fn initial_bearing_deg(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let phi_a = lat_a.to_radians();
    let phi_b = lat_b.to_radians();
    let d_lon = (lon_b - lon_a).to_radians();

    let y = d_lon.sin() * phi_b.cos();
    let x = phi_a.cos() * phi_b.sin() - phi_a.sin() * phi_b.cos() * d_lon.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// True when the coordinate lies within `[-90, 90] x [-180, 180]`
pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_same_point() {
        assert_eq!(distance_km(-6.8, 39.27, -6.8, 39.27), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // 2 * pi * R / 360
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_distance_is_symmetric() {
        let ab = distance_km(-6.8235, 39.2695, -6.7924, 39.2083);
        let ba = distance_km(-6.7924, 39.2083, -6.8235, 39.2695);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_dar_es_salaam_to_dodoma() {
        // Roughly 400 km as the crow flies
        let d = distance_km(-6.7924, 39.2083, -6.1630, 35.7516);
        assert!((380.0..420.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert!((initial_bearing_deg(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((initial_bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_deg(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_deg(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(is_valid_coordinate(-6.8, 39.27));
        assert!(is_valid_coordinate(90.0, -180.0));
        assert!(!is_valid_coordinate(90.1, 0.0));
        assert!(!is_valid_coordinate(0.0, 180.5));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
    }

    #[test]
    fn test_geopoint_helpers() {
        let a = GeoPoint::new(-6.80, 39.27);
        let b = GeoPoint::new(-6.80, 39.27);
        assert_eq!(a.distance_km_to(&b), 0.0);
        assert!(a.is_valid());
        assert_eq!(a.to_string(), "(-6.80000, 39.27000)");
    }
}
