//! Blade vs. item collision
//!
//! Items are circles and the blade is a polyline, so every test reduces to
//! the distance from a circle center to a line segment.

use glam::Vec2;

/// Closest point to `p` on segment `a`-`b`
#[inline]
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < f32::EPSILON {
        return a; // Degenerate segment
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// True if segment `a`-`b` touches the circle at `center` with `radius`
#[inline]
pub fn segment_intersects_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    closest_point_on_segment(a, b, center).distance_squared(center) <= radius * radius
}

/// Index of the first segment (oldest first) that cuts the circle
pub fn first_cutting_segment(
    segments: &[(Vec2, Vec2)],
    center: Vec2,
    radius: f32,
) -> Option<usize> {
    segments
        .iter()
        .position(|&(a, b)| segment_intersects_circle(a, b, center, radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_segment_through_center_hits() {
        let hit = segment_intersects_circle(
            Vec2::new(-100.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::ZERO,
            10.0,
        );
        assert!(hit);
    }

    #[test]
    fn test_segment_passing_wide_misses() {
        let hit = segment_intersects_circle(
            Vec2::new(-100.0, 20.0),
            Vec2::new(100.0, 20.0),
            Vec2::ZERO,
            10.0,
        );
        assert!(!hit);
    }

    #[test]
    fn test_tangent_counts_as_hit() {
        let hit = segment_intersects_circle(
            Vec2::new(-100.0, 10.0),
            Vec2::new(100.0, 10.0),
            Vec2::ZERO,
            10.0,
        );
        assert!(hit);
    }

    #[test]
    fn test_segment_stopping_short_misses() {
        // Line through the circle, but the segment ends before reaching it
        let hit = segment_intersects_circle(
            Vec2::new(-100.0, 0.0),
            Vec2::new(-50.0, 0.0),
            Vec2::ZERO,
            10.0,
        );
        assert!(!hit);
    }

    #[test]
    fn test_segment_inside_circle_hits() {
        let hit = segment_intersects_circle(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::ZERO,
            10.0,
        );
        assert!(hit);
    }

    #[test]
    fn test_degenerate_segment_is_point_test() {
        let p = Vec2::new(3.0, 4.0);
        assert!(segment_intersects_circle(p, p, Vec2::ZERO, 5.0));
        assert!(!segment_intersects_circle(p, p, Vec2::ZERO, 4.9));
    }

    #[test]
    fn test_first_cutting_segment() {
        let segments = [
            (Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)),
            (Vec2::new(10.0, 0.0), Vec2::new(100.0, 100.0)),
            (Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0)),
        ];
        assert_eq!(first_cutting_segment(&segments, Vec2::new(150.0, 100.0), 5.0), Some(2));
        assert_eq!(first_cutting_segment(&segments, Vec2::new(55.0, 55.0), 5.0), Some(1));
        assert_eq!(first_cutting_segment(&segments, Vec2::new(500.0, 500.0), 5.0), None);
    }

    proptest! {
        #[test]
        fn prop_closest_point_is_no_farther_than_endpoints(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0,
            px in -500.0f32..500.0, py in -500.0f32..500.0,
        ) {
            let (a, b, p) = (Vec2::new(ax, ay), Vec2::new(bx, by), Vec2::new(px, py));
            let d = closest_point_on_segment(a, b, p).distance(p);
            prop_assert!(d <= a.distance(p) + 1e-2);
            prop_assert!(d <= b.distance(p) + 1e-2);
        }

        #[test]
        fn prop_circle_around_endpoint_is_hit(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0,
            r in 1.0f32..100.0,
        ) {
            let (a, b) = (Vec2::new(ax, ay), Vec2::new(bx, by));
            prop_assert!(segment_intersects_circle(a, b, a, r));
            prop_assert!(segment_intersects_circle(a, b, b, r));
        }
    }
}
