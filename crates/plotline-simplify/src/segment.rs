//! Squared distance from a point to a line segment.

use crate::types::Point;

/// Squared distance from `p` to the closest point on the segment `a`-`b`.
///
/// Unlike a perpendicular distance to the infinite line, points beyond
/// either end measure to that endpoint. When `a` and `b` coincide the
/// segment degenerates to the point `a`.
#[must_use]
pub fn segment_distance_squared(a: Point, b: Point, p: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    let closest = if length_sq == 0.0 {
        a
    } else {
        let t = (p.x - a.x).mul_add(dx, (p.y - a.y) * dy) / length_sq;
        if t > 1.0 {
            b
        } else if t > 0.0 {
            Point::new(t.mul_add(dx, a.x), t.mul_add(dy, a.y))
        } else {
            a
        }
    };

    p.distance_squared(closest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "got {actual}, expected {expected}"
        );
    }

    #[test]
    fn perpendicular_foot_inside_segment() {
        // (1, 3) is 3 units above the segment (0,0)-(2,0).
        let d = segment_distance_squared(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 3.0),
        );
        assert_close(d, 9.0);
    }

    #[test]
    fn diagonal_segment() {
        // (2, -1) to line (0,0)->(4,2): distance 8 / sqrt(20), squared 64 / 20.
        let d = segment_distance_squared(
            Point::new(0.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(2.0, -1.0),
        );
        assert_close(d, 64.0 / 20.0);
    }

    #[test]
    fn beyond_end_measures_to_end() {
        // (5, 1) projects past (2,0); nearest point is (2,0).
        let d = segment_distance_squared(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(5.0, 1.0),
        );
        assert_close(d, 10.0);
    }

    #[test]
    fn before_start_measures_to_start() {
        let d = segment_distance_squared(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(-3.0, 4.0),
        );
        assert_close(d, 25.0);
    }

    #[test]
    fn projection_exactly_at_end() {
        // t == 1 uses the interpolated point, which equals b.
        let d = segment_distance_squared(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 1.0),
        );
        assert_close(d, 1.0);
    }

    #[test]
    fn degenerate_segment_measures_to_point() {
        let d = segment_distance_squared(
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(4.0, 5.0),
        );
        assert_close(d, 25.0);
    }

    #[test]
    fn point_on_segment_is_zero() {
        let d = segment_distance_squared(
            Point::new(0.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(1.0, 1.0),
        );
        assert_close(d, 0.0);
    }

    #[test]
    fn non_finite_query_is_non_finite() {
        let d = segment_distance_squared(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(f64::NAN, 0.0),
        );
        assert!(!d.is_finite());
    }
}
