//! # Geographic locations
//!
//! GPS fixes and the short range distance and bearing calculations used for navigation.
//!
//! Bearings are given in the vehicle heading frame used by the compass: zero points north and
//! angles increase anticlockwise when viewed from above, so west is `+pi/2` and east is `-pi/2`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Mean radius of the earth.
///
/// Units: meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A GPS fix.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Units: degrees, north positive
    pub latitude_deg: f64,

    /// Units: degrees, east positive
    pub longitude_deg: f64,

    /// Units: meters
    #[serde(default)]
    pub elevation_m: f64,
}

/// A latitude/longitude bounding box.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRegion {
    pub min_latitude_deg: f64,
    pub max_latitude_deg: f64,
    pub min_longitude_deg: f64,
    pub max_longitude_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Location {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            elevation_m: 0.0,
        }
    }

    /// Determine if this is a usable fix.
    ///
    /// Receivers report `(0, 0)` when they have no fix, so that point is rejected along with
    /// anything non-finite or out of range.
    pub fn is_valid(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && self.latitude_deg.abs() <= 90.0
            && self.longitude_deg.abs() <= 180.0
            && !(self.latitude_deg == 0.0 && self.longitude_deg == 0.0)
    }

    /// Great circle distance to `other` (haversine).
    ///
    /// Units: meters
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat_0 = self.latitude_deg.to_radians();
        let lat_1 = other.latitude_deg.to_radians();
        let d_lat = lat_1 - lat_0;
        let d_lon = (other.longitude_deg - self.longitude_deg).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat_0.cos() * lat_1.cos() * (d_lon / 2.0).sin().powi(2);

        // Clamp guards against rounding pushing `a` just over 1
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Bearing from this location to `other` in the heading frame.
    ///
    /// Uses an equirectangular approximation which is accurate over the few kilometers the
    /// navigator works with. Returns zero for coincident points.
    ///
    /// Units: radians, in (-pi, pi]
    pub fn bearing_to(&self, other: &Location) -> f64 {
        if self.latitude_deg == other.latitude_deg && self.longitude_deg == other.longitude_deg {
            return 0.0;
        }

        let mean_lat = ((self.latitude_deg + other.latitude_deg) / 2.0).to_radians();
        let north = other.latitude_deg - self.latitude_deg;
        let east = (other.longitude_deg - self.longitude_deg) * mean_lat.cos();

        // West is the positive axis of the heading frame
        (-east).atan2(north)
    }

    /// The location reached by moving `north_m` north and `east_m` east of this one.
    pub fn offset_by(&self, north_m: f64, east_m: f64) -> Location {
        let d_lat = (north_m / EARTH_RADIUS_M).to_degrees();
        let d_lon = (east_m / (EARTH_RADIUS_M * self.latitude_deg.to_radians().cos())).to_degrees();

        Location {
            latitude_deg: self.latitude_deg + d_lat,
            longitude_deg: self.longitude_deg + d_lon,
            elevation_m: self.elevation_m,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.7}, {:.7}, {:.1})",
            self.latitude_deg, self.longitude_deg, self.elevation_m
        )
    }
}

impl GeoRegion {
    pub fn contains(&self, loc: &Location) -> bool {
        loc.latitude_deg >= self.min_latitude_deg
            && loc.latitude_deg <= self.max_latitude_deg
            && loc.longitude_deg >= self.min_longitude_deg
            && loc.longitude_deg <= self.max_longitude_deg
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn origin() -> Location {
        Location::new(30.2655183, -97.7690083)
    }

    #[test]
    fn test_validity() {
        assert!(origin().is_valid());
        assert!(!Location::new(0.0, 0.0).is_valid());
        assert!(!Location::new(91.0, 10.0).is_valid());
        assert!(!Location::new(f64::NAN, 10.0).is_valid());
        assert!(Location::new(0.0, 10.0).is_valid());
    }

    #[test]
    fn test_distance() {
        let a = origin();
        assert_eq!(a.distance_to(&a), 0.0);

        // One thousandth of a degree of latitude is about 111 m
        let b = Location::new(a.latitude_deg + 0.001, a.longitude_deg);
        let d = a.distance_to(&b);
        assert!((d - 111.19).abs() < 0.1, "distance was {}", d);

        // Symmetric
        assert!((b.distance_to(&a) - d).abs() < 1e-9);
    }

    #[test]
    fn test_offset_round_trip_distance() {
        let a = origin();
        let b = a.offset_by(30.0, 40.0);
        assert!((a.distance_to(&b) - 50.0).abs() < 0.05);
    }

    #[test]
    fn test_bearing_frame() {
        let a = origin();

        assert!(a.bearing_to(&a.offset_by(10.0, 0.0)).abs() < 1e-6);
        assert!((a.bearing_to(&a.offset_by(0.0, -10.0)) - FRAC_PI_2).abs() < 1e-4);
        assert!((a.bearing_to(&a.offset_by(0.0, 10.0)) + FRAC_PI_2).abs() < 1e-4);
        assert!((a.bearing_to(&a.offset_by(-10.0, 0.0)).abs() - std::f64::consts::PI).abs() < 1e-6);
        assert_eq!(a.bearing_to(&a), 0.0);
    }

    #[test]
    fn test_region() {
        let region = GeoRegion {
            min_latitude_deg: 30.0,
            max_latitude_deg: 31.0,
            min_longitude_deg: -98.0,
            max_longitude_deg: -97.0,
        };
        assert!(region.contains(&origin()));
        assert!(!region.contains(&Location::new(29.9, -97.5)));
    }
}
