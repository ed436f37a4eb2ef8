//! Great-circle distance between two coordinates.

use crate::models::GeoPoint;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Returns the haversine distance between `a` and `b`, in metres.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::haversine_distance_m;
/// use hr_engine::models::GeoPoint;
///
/// let anchor = GeoPoint::new(10.801829, 106.714231);
/// assert_eq!(haversine_distance_m(anchor, anchor), 0.0);
/// ```
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Clamp guards against h drifting just above 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> GeoPoint {
        GeoPoint::new(10.801829, 106.714231)
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_distance_m(anchor(), anchor()), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_distance_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        // 2 * pi * R / 360
        assert!((d - 111_194.93).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let other = GeoPoint::new(10.7769, 106.7009);
        let there = haversine_distance_m(anchor(), other);
        let back = haversine_distance_m(other, anchor());
        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn test_nearby_point_within_geofence() {
        // Roughly 55 m north of the anchor.
        let nearby = GeoPoint::new(10.802329, 106.714231);
        let d = haversine_distance_m(anchor(), nearby);
        assert!(d > 50.0 && d < 60.0, "got {}", d);
    }

    #[test]
    fn test_antipodal_points() {
        let d = haversine_distance_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }
}
