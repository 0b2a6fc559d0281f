//! Great-circle and planar distance calculations.
//!
//! Two interchangeable calculators share one trait: a precise haversine earth
//! model and a fast equirectangular approximation. Both expose an
//! order-preserving *normalised* distance so searches can compare candidates
//! without taking square roots, converting back to meters only once at the
//! end.

use geo::Point;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Mean earth circumference in meters.
pub const EARTH_CIRCUMFERENCE: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS_METERS;

/// Shared planar calculator instance (fast approximation).
pub static DIST_PLANE: DistancePlane = DistancePlane;

/// Shared earth-model calculator instance (precise).
pub static DIST_EARTH: DistanceEarth = DistanceEarth;

/// Longitude shrink factor at the mean latitude of a segment.
fn shrink_factor(a_lat: f64, b_lat: f64) -> f64 {
    ((a_lat + b_lat) / 2.0).to_radians().cos()
}

pub trait DistanceCalc: Sync {
    /// Distance in meters between two coordinates.
    fn calc_dist(&self, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64;

    /// Order-preserving normalised distance between two coordinates.
    ///
    /// Normalised values of one calculator must never be compared against
    /// those of another.
    fn calc_normalized_dist(&self, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64;

    /// Convert a distance in meters into its normalised form.
    fn normalize_dist(&self, dist: f64) -> f64;

    /// Convert a normalised distance back into meters.
    fn denormalize_dist(&self, norm_dist: f64) -> f64;

    /// True if the segment between the two longitudes crosses the
    /// antimeridian.
    fn is_cross_boundary(&self, lon1: f64, lon2: f64) -> bool {
        (lon1 - lon2).abs() > 300.0
    }

    /// Circumference in meters of the circle of latitude `lat`.
    fn calc_circumference(&self, lat: f64) -> f64 {
        EARTH_CIRCUMFERENCE * lat.to_radians().cos()
    }

    /// True if the perpendicular from `(r_lat, r_lon)` onto the line through
    /// a and b falls between a and b.
    fn valid_edge_distance(
        &self,
        r_lat: f64,
        r_lon: f64,
        a_lat: f64,
        a_lon: f64,
        b_lat: f64,
        b_lon: f64,
    ) -> bool {
        let shrink = shrink_factor(a_lat, b_lat);
        let a_lon = a_lon * shrink;
        let b_lon = b_lon * shrink;
        let r_lon = r_lon * shrink;

        let ar_x = r_lon - a_lon;
        let ar_y = r_lat - a_lat;
        let ab_x = b_lon - a_lon;
        let ab_y = b_lat - a_lat;
        let ab_ar = ar_x * ab_x + ar_y * ab_y;

        let rb_x = b_lon - r_lon;
        let rb_y = b_lat - r_lat;
        let ab_rb = rb_x * ab_x + rb_y * ab_y;

        // both angles at a and b are acute exactly when the foot lies inside
        ab_ar > 0.0 && ab_rb > 0.0
    }

    /// Normalised distance from `(r_lat, r_lon)` to the segment a-b, assuming
    /// `valid_edge_distance` holds.
    fn calc_normalized_edge_distance(
        &self,
        r_lat: f64,
        r_lon: f64,
        a_lat: f64,
        a_lon: f64,
        b_lat: f64,
        b_lon: f64,
    ) -> f64 {
        let shrink = shrink_factor(a_lat, b_lat);
        let a_lon_s = a_lon * shrink;
        let b_lon_s = b_lon * shrink;
        let r_lon_s = r_lon * shrink;

        let delta_lon = b_lon_s - a_lon_s;
        let delta_lat = b_lat - a_lat;

        if delta_lat == 0.0 {
            // horizontal edge
            return self.calc_normalized_dist(a_lat, r_lon, r_lat, r_lon);
        }
        if delta_lon == 0.0 {
            // vertical edge
            return self.calc_normalized_dist(r_lat, a_lon, r_lat, r_lon);
        }

        let norm = delta_lon * delta_lon + delta_lat * delta_lat;
        let factor = ((r_lon_s - a_lon_s) * delta_lon + (r_lat - a_lat) * delta_lat) / norm;
        let c_lon = a_lon_s + factor * delta_lon;
        let c_lat = a_lat + factor * delta_lat;
        self.calc_normalized_dist(c_lat, c_lon / shrink, r_lat, r_lon)
    }

    /// Projection of `(r_lat, r_lon)` onto the segment a-b as a lon/lat point.
    fn calc_crossing_point_to_edge(
        &self,
        r_lat: f64,
        r_lon: f64,
        a_lat: f64,
        a_lon: f64,
        b_lat: f64,
        b_lon: f64,
    ) -> Point<f64> {
        let shrink = shrink_factor(a_lat, b_lat);
        let a_lon_s = a_lon * shrink;
        let b_lon_s = b_lon * shrink;
        let r_lon_s = r_lon * shrink;

        let delta_lon = b_lon_s - a_lon_s;
        let delta_lat = b_lat - a_lat;

        if delta_lat == 0.0 {
            return Point::new(r_lon, a_lat);
        }
        if delta_lon == 0.0 {
            return Point::new(a_lon, r_lat);
        }

        let norm = delta_lon * delta_lon + delta_lat * delta_lat;
        let factor = ((r_lon_s - a_lon_s) * delta_lon + (r_lat - a_lat) * delta_lat) / norm;
        let c_lon = a_lon_s + factor * delta_lon;
        let c_lat = a_lat + factor * delta_lat;
        Point::new(c_lon / shrink, c_lat)
    }
}

/// Haversine great-circle distances on a spherical earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceEarth;

impl DistanceCalc for DistanceEarth {
    fn calc_dist(&self, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
        self.denormalize_dist(self.calc_normalized_dist(from_lat, from_lon, to_lat, to_lon))
    }

    fn calc_normalized_dist(&self, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
        let sin_delta_lat = ((to_lat - from_lat).to_radians() / 2.0).sin();
        let sin_delta_lon = ((to_lon - from_lon).to_radians() / 2.0).sin();
        sin_delta_lat * sin_delta_lat
            + sin_delta_lon
                * sin_delta_lon
                * from_lat.to_radians().cos()
                * to_lat.to_radians().cos()
    }

    fn normalize_dist(&self, dist: f64) -> f64 {
        let tmp = (dist / (2.0 * EARTH_RADIUS_METERS)).sin();
        tmp * tmp
    }

    fn denormalize_dist(&self, norm_dist: f64) -> f64 {
        2.0 * EARTH_RADIUS_METERS * norm_dist.sqrt().asin()
    }
}

/// Equirectangular projection, accurate enough for the small distances of a
/// snapping search and considerably faster than the earth model.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistancePlane;

impl DistanceCalc for DistancePlane {
    fn calc_dist(&self, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
        self.denormalize_dist(self.calc_normalized_dist(from_lat, from_lon, to_lat, to_lon))
    }

    fn calc_normalized_dist(&self, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
        let delta_lat = (to_lat - from_lat).to_radians();
        let delta_lon = (to_lon - from_lon).to_radians();
        let projected_lon = ((from_lat + to_lat) / 2.0).to_radians().cos() * delta_lon;
        delta_lat * delta_lat + projected_lon * projected_lon
    }

    fn normalize_dist(&self, dist: f64) -> f64 {
        let tmp = dist / EARTH_RADIUS_METERS;
        tmp * tmp
    }

    fn denormalize_dist(&self, norm_dist: f64) -> f64 {
        EARTH_RADIUS_METERS * norm_dist.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earth_known_distance() {
        // Berlin -> Hamburg, roughly 255 km
        let dist = DIST_EARTH.calc_dist(52.52, 13.405, 53.551, 9.994);
        assert!((dist - 255_000.0).abs() < 3_000.0, "got {dist}");
    }

    #[test]
    fn test_plane_matches_earth_for_short_distances() {
        let (lat1, lon1) = (49.0, 11.0);
        let (lat2, lon2) = (49.001, 11.001);
        let earth = DIST_EARTH.calc_dist(lat1, lon1, lat2, lon2);
        let plane = DIST_PLANE.calc_dist(lat1, lon1, lat2, lon2);
        assert!((earth - plane).abs() < 0.01, "{earth} vs {plane}");
    }

    #[test]
    fn test_normalized_round_trip() {
        for calc in [&DIST_EARTH as &dyn DistanceCalc, &DIST_PLANE] {
            for dist in [0.1, 1.0, 100.0, 10_000.0] {
                let normed = calc.normalize_dist(dist);
                assert!((calc.denormalize_dist(normed) - dist).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_normalized_preserves_order() {
        let near = DIST_PLANE.calc_normalized_dist(49.0, 11.0, 49.001, 11.0);
        let far = DIST_PLANE.calc_normalized_dist(49.0, 11.0, 49.002, 11.0);
        assert!(near < far);
    }

    #[test]
    fn test_valid_edge_distance() {
        // horizontal segment from (0, 0) to (0, 1)
        assert!(DIST_PLANE.valid_edge_distance(0.5, 0.5, 0.0, 0.0, 0.0, 1.0));
        // beyond the b endpoint
        assert!(!DIST_PLANE.valid_edge_distance(0.5, 1.5, 0.0, 0.0, 0.0, 1.0));
        // before the a endpoint
        assert!(!DIST_PLANE.valid_edge_distance(0.5, -0.5, 0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_edge_distance_matches_point_distance_on_foot() {
        let (r_lat, r_lon) = (0.001, 0.5);
        let edge = DIST_PLANE.calc_normalized_edge_distance(r_lat, r_lon, 0.0, 0.0, 0.0, 1.0);
        let point = DIST_PLANE.calc_normalized_dist(r_lat, r_lon, 0.0, r_lon);
        assert!((edge - point).abs() < 1e-15);
    }

    #[test]
    fn test_crossing_point() {
        let crossing = DIST_PLANE.calc_crossing_point_to_edge(0.5, 0.25, 0.0, 0.0, 1.0, 1.0);
        // diagonal segment, query slightly left of it
        assert!((crossing.y() - crossing.x()).abs() < 1e-9);
        assert!(crossing.y() > 0.25 && crossing.y() < 0.5);
    }

    #[test]
    fn test_crossing_point_degenerate_axes() {
        let horizontal = DIST_PLANE.calc_crossing_point_to_edge(0.5, 0.5, 0.0, 0.0, 0.0, 1.0);
        assert_eq!((horizontal.y(), horizontal.x()), (0.0, 0.5));
        let vertical = DIST_PLANE.calc_crossing_point_to_edge(0.5, 0.5, 0.0, 0.0, 1.0, 0.0);
        assert_eq!((vertical.y(), vertical.x()), (0.5, 0.0));
    }

    #[test]
    fn test_cross_boundary() {
        assert!(DIST_EARTH.is_cross_boundary(179.9, -179.9));
        assert!(!DIST_EARTH.is_cross_boundary(10.0, 11.0));
    }

    #[test]
    fn test_circumference() {
        let equator = DIST_EARTH.calc_circumference(0.0);
        assert!((equator - EARTH_CIRCUMFERENCE).abs() < 1.0);
        let pole = DIST_EARTH.calc_circumference(90.0);
        assert!(pole.abs() < 1.0);
    }
}
