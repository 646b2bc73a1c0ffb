//! Great-circle distance and interpolation.
//!
//! Points are `geo` points in degrees (`x` = longitude, `y` = latitude).
//! Both operations use `geo`'s [`Haversine`] measure, so distances are
//! meters on the GRS80 mean-radius sphere and [`distance`] agrees with
//! [`interpolate`].

use geo::{Distance, Haversine, InterpolatePoint, Point};

/// Great-circle distance between `a` and `b` in meters.
///
/// Symmetric, and zero when `a == b`.
#[must_use]
pub fn distance(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b)
}

/// Returns the point at fractional `ratio` along the great circle from
/// `a` to `b`.
///
/// `distance` must be [`distance`]`(a, b)`. A zero distance returns `a`
/// unchanged, as do ratios at or below `0`; ratios at or above `1`
/// return `b`.
#[must_use]
pub fn interpolate(distance: f64, ratio: f64, a: Point<f64>, b: Point<f64>) -> Point<f64> {
    if distance <= 0.0 || ratio <= 0.0 {
        return a;
    }
    if ratio >= 1.0 {
        return b;
    }

    Haversine.point_at_ratio_between(a, b, ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let a = Point::new(-87.6278, 41.8827);
        let b = Point::new(-87.6300, 41.8850);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-9);
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let a = Point::new(13.404_954, 52.520_008);
        assert!(distance(a, a).abs() < f64::EPSILON);
    }

    #[test]
    fn one_degree_of_longitude_on_equator() {
        let d = distance(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert!((d - 111_195.08).abs() < 1.0);
    }

    #[test]
    fn interpolate_endpoints() {
        let a = Point::new(-87.6278, 41.8827);
        let b = Point::new(-87.6300, 41.8850);
        let d = distance(a, b);
        assert_eq!(interpolate(d, 0.0, a, b), a);
        assert_eq!(interpolate(d, 1.0, a, b), b);
    }

    #[test]
    fn interpolate_zero_distance_returns_start() {
        let a = Point::new(174.76, -36.85);
        let p = interpolate(0.0, 0.5, a, a);
        assert_eq!(p, a);
        assert!(!p.x().is_nan() && !p.y().is_nan());
    }

    #[test]
    fn interpolate_midpoint_is_equidistant() {
        let a = Point::new(-87.6278, 41.8827);
        let b = Point::new(-87.6178, 41.8927);
        let d = distance(a, b);
        let mid = interpolate(d, 0.5, a, b);
        assert!((distance(a, mid) - distance(mid, b)).abs() < 1e-6);
        assert!((distance(a, mid) - d / 2.0).abs() < 1e-6);
    }

    #[test]
    fn interpolate_clamps_ratio_outside_unit_range() {
        let a = Point::new(-87.6278, 41.8827);
        let b = Point::new(-87.6300, 41.8850);
        let d = distance(a, b);
        assert_eq!(interpolate(d, -0.5, a, b), a);
        assert_eq!(interpolate(d, 1.5, a, b), b);
    }

    #[test]
    fn interpolate_along_equator() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.001, 0.0);
        let p = interpolate(distance(a, b), 0.25, a, b);
        assert!((p.x() - 0.000_25).abs() < 1e-10);
        assert!(p.y().abs() < 1e-10);
    }
}
