use crate::frame::{DrawItem, Frame, Placement};
use crate::viewport::Point;

/// Extra world-space slack around edge segments.
const EDGE_TOLERANCE: f64 = 4.0;

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

fn hit(item: &DrawItem, p: Point) -> bool {
    match item.placement {
        Placement::Point { x, y } => {
            let local = Point::new(p.x - x, p.y - y);
            item.primitives.iter().any(|prim| prim.contains(local))
        }
        Placement::Segment { x1, y1, x2, y2 } => {
            let width = item
                .primitives
                .iter()
                .find_map(|prim| match prim {
                    crate::shape::Primitive::Segment { line_width, .. } => Some(*line_width),
                    _ => None,
                })
                .unwrap_or(1.0);
            distance_to_segment(p, Point::new(x1, y1), Point::new(x2, y2))
                <= width / 2.0 + EDGE_TOLERANCE
        }
    }
}

/// Topmost item under the world point `p`, walking the frame back to front.
pub fn pick(frame: &Frame, p: Point) -> Option<&DrawItem> {
    frame.items().rev().find(|item| hit(item, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Point::new(-4.0, 3.0), a, b), 5.0);
    }
}
