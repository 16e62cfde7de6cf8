//! Great-circle distance between coordinate pairs.
//!
//! Provider responses are not trusted to be in range, so every entry point
//! validates degrees before touching the trigonometry.

use thiserror::Error;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors raised by coordinate validation.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("invalid coordinate: {field} = {value} is outside [{min}, {max}]")]
    InvalidCoordinate {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Checks that a latitude/longitude pair is within valid degree ranges.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] naming the offending field.
pub fn validate(latitude: f64, longitude: f64) -> Result<(), GeoError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(GeoError::InvalidCoordinate {
            field: "latitude",
            value: latitude,
            min: -90.0,
            max: 90.0,
        });
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeoError::InvalidCoordinate {
            field: "longitude",
            value: longitude,
            min: -180.0,
            max: 180.0,
        });
    }
    Ok(())
}

/// Haversine great-circle distance in kilometres between two points given in
/// decimal degrees.
///
/// Identical points return exactly `0.0`; the result is symmetric within
/// floating-point tolerance.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] if either point is out of range.
pub fn distance_km(a_lat: f64, a_lon: f64, b_lat: f64, b_lon: f64) -> Result<f64, GeoError> {
    validate(a_lat, a_lon)?;
    validate(b_lat, b_lon)?;

    // Exact zero for identical inputs; the formula would otherwise pick up
    // rounding noise from the trig round-trip.
    if a_lat == b_lat && a_lon == b_lon {
        return Ok(0.0);
    }

    let d_lat = (b_lat - a_lat).to_radians();
    let d_lon = (b_lon - a_lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a_lat.to_radians().cos() * b_lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    Ok(2.0 * EARTH_RADIUS_KM * h.sqrt().asin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_exactly_zero() {
        let d = distance_km(12.9382107, 77.6992385, 12.9382107, 77.6992385).unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_km(12.9382, 77.6992, 12.9189, 77.6701).unwrap();
        let ba = distance_km(12.9189, 77.6701, 12.9382, 77.6992).unwrap();
        let rel = (ab - ba).abs() / ab.max(ba);
        assert!(rel < 1e-9, "relative asymmetry {rel}");
    }

    #[test]
    fn known_branch_pair_is_about_3_7_km() {
        // PANATHUR -> BELLANDUR, from the published branch coordinates.
        let d = distance_km(12.9382, 77.6992, 12.9189, 77.6701).unwrap();
        assert!((d - 3.7).abs() < 0.1, "got {d} km");
    }

    #[test]
    fn distance_is_non_negative_over_a_spread_of_points() {
        let pts = [
            (0.0, 0.0),
            (90.0, 0.0),
            (-90.0, 0.0),
            (45.0, 180.0),
            (-45.0, -180.0),
            (12.9382, 77.6992),
        ];
        for &(alat, alon) in &pts {
            for &(blat, blon) in &pts {
                let d = distance_km(alat, alon, blat, blon).unwrap();
                assert!(d >= 0.0);
            }
        }
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance_km(0.0, 0.0, 0.0, 180.0).unwrap();
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half).abs() < 1.0, "got {d}, expected ~{half}");
    }

    #[test]
    fn rejects_latitude_out_of_range() {
        assert!(distance_km(90.01, 0.0, 0.0, 0.0).is_err());
        assert!(distance_km(0.0, 0.0, -90.01, 0.0).is_err());
    }

    #[test]
    fn rejects_longitude_out_of_range() {
        assert!(distance_km(0.0, 180.01, 0.0, 0.0).is_err());
        assert!(distance_km(0.0, 0.0, 0.0, -181.0).is_err());
    }

    #[test]
    fn rejects_non_finite_input() {
        assert!(distance_km(f64::NAN, 0.0, 0.0, 0.0).is_err());
        assert!(distance_km(0.0, f64::INFINITY, 0.0, 0.0).is_err());
    }
}
