//! Joint angle calculation
//!
//! Angles are measured at the middle point from the difference of the two
//! ray directions, then folded into [0, 180].

use crate::models::Point2D;

/// Angle at `vertex` (degrees, 0-180) between the rays towards `a` and `c`.
///
/// Coincident points are not an error: `atan2(0, 0)` is 0, so a degenerate ray
/// contributes a direction of 0 and the result is whatever the other ray
/// makes with the x axis (0 when both rays are degenerate).
pub fn angle_at(a: Point2D, vertex: Point2D, c: Point2D) -> f64 {
    let radians =
        (c.y - vertex.y).atan2(c.x - vertex.x) - (a.y - vertex.y).atan2(a.x - vertex.x);
    let angle = radians.to_degrees().abs();

    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
