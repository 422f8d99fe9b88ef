//! Planar polygon helpers shared by the tile source and the cut analyzer.
//!
//! Rings are plain vertex lists. A closing vertex equal to the first one is
//! allowed but not required; every function here treats the ring as closed.

use serde::{Deserialize, Serialize};

/// A 2D point `(x, y)` in surface units.
pub type Point = (f64, f64);

/// Tolerance for equality tests on lengths.
pub const LENGTH_EPSILON: f64 = 1e-9;

/// Axis-aligned bounding box of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// Width/height pair without a position, used for requests and offcuts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn rotated(&self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// Shoelace sum over the closed ring. Positive for counter-clockwise rings.
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..ring.len() {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % ring.len()];
        sum += x1 * y2 - x2 * y1;
    }
    sum / 2.0
}

/// Unsigned polygon area. Winding does not matter.
pub fn polygon_area(ring: &[Point]) -> f64 {
    signed_area(ring).abs()
}

pub fn bounding_box(ring: &[Point]) -> Option<BoundingBox> {
    let (&(x0, y0), rest) = ring.split_first()?;
    let mut bbox = BoundingBox {
        min_x: x0,
        min_y: y0,
        max_x: x0,
        max_y: y0,
    };
    for &(x, y) in rest {
        bbox.min_x = bbox.min_x.min(x);
        bbox.min_y = bbox.min_y.min(y);
        bbox.max_x = bbox.max_x.max(x);
        bbox.max_y = bbox.max_y.max(y);
    }
    Some(bbox)
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Drops a trailing vertex that repeats the first one.
fn open_ring(ring: &[Point]) -> &[Point] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// True when every turn of the ring goes the same way. Collinear runs are
/// tolerated.
pub fn is_convex(ring: &[Point]) -> bool {
    let ring = open_ring(ring);
    if ring.len() < 3 {
        return false;
    }

    let mut sign = 0.0_f64;
    for i in 0..ring.len() {
        let turn = cross(
            ring[i],
            ring[(i + 1) % ring.len()],
            ring[(i + 2) % ring.len()],
        );
        if turn.abs() <= LENGTH_EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Clips `subject` against the convex polygon `clip` (Sutherland-Hodgman).
///
/// `clip` may be wound either way. `subject` may be any simple ring; the
/// returned ring can contain collinear or repeated vertices, which do not
/// affect its area or bounding box. An empty result means no overlap.
pub fn clip_convex(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    let clip = open_ring(clip);
    if clip.len() < 3 {
        return Vec::new();
    }

    let ccw: Vec<Point> = if signed_area(clip) < 0.0 {
        clip.iter().rev().copied().collect()
    } else {
        clip.to_vec()
    };

    let mut output: Vec<Point> = open_ring(subject).to_vec();
    for i in 0..ccw.len() {
        if output.is_empty() {
            break;
        }
        let a = ccw[i];
        let b = ccw[(i + 1) % ccw.len()];
        let inside = |p: Point| cross(a, b, p) >= -LENGTH_EPSILON;

        let input = std::mem::take(&mut output);
        for j in 0..input.len() {
            let current = input[j];
            let previous = input[(j + input.len() - 1) % input.len()];
            match (inside(previous), inside(current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(intersect(previous, current, a, b)),
                (false, true) => {
                    output.push(intersect(previous, current, a, b));
                    output.push(current);
                }
                (false, false) => {}
            }
        }
    }

    if output.len() < 3 {
        Vec::new()
    } else {
        output
    }
}

/// Intersection of segment `p1p2` with the infinite line through `a` and `b`.
fn intersect(p1: Point, p2: Point, a: Point, b: Point) -> Point {
    let d1 = cross(a, b, p1);
    let d2 = cross(a, b, p2);
    let denom = d1 - d2;
    if denom.abs() <= f64::EPSILON {
        return p2;
    }
    let t = d1 / denom;
    (p1.0 + (p2.0 - p1.0) * t, p1.1 + (p2.1 - p1.1) * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size)]
    }

    #[test]
    fn test_area_ignores_winding_and_closing_vertex() {
        let ccw = square(0.0, 0.0, 10.0);
        let mut cw = ccw.clone();
        cw.reverse();
        let mut closed = ccw.clone();
        closed.push(ccw[0]);

        assert_relative_eq!(signed_area(&ccw), 100.0);
        assert_relative_eq!(signed_area(&cw), -100.0);
        assert_relative_eq!(polygon_area(&cw), 100.0);
        assert_relative_eq!(polygon_area(&closed), 100.0);
    }

    #[test]
    fn test_degenerate_rings_have_no_area() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[(0.0, 0.0), (1.0, 1.0)]), 0.0);
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_bounding_box_of_triangle() {
        let bbox = bounding_box(&[(2.0, 1.0), (8.0, 1.0), (5.0, 4.0)]).unwrap();
        assert_relative_eq!(bbox.width(), 6.0);
        assert_relative_eq!(bbox.height(), 3.0);
        assert_relative_eq!(bbox.area(), 18.0);
    }

    #[test]
    fn test_convexity() {
        assert!(is_convex(&square(0.0, 0.0, 1.0)));
        let l_shape = vec![
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ];
        assert!(!is_convex(&l_shape));
    }

    #[test]
    fn test_clip_overlapping_squares() {
        let clipped = clip_convex(&square(5.0, 5.0, 10.0), &square(0.0, 0.0, 10.0));
        assert_relative_eq!(polygon_area(&clipped), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_disjoint_is_empty() {
        let clipped = clip_convex(&square(20.0, 20.0, 5.0), &square(0.0, 0.0, 10.0));
        assert!(polygon_area(&clipped) < 1e-12);
    }

    #[test]
    fn test_clip_diamond_to_half_plane_gives_triangle() {
        let diamond = vec![(0.0, 0.0), (5.0, -5.0), (10.0, 0.0), (5.0, 5.0)];
        let mut clip = square(-1.0, 0.0, 20.0);
        clip.reverse();
        let clipped = clip_convex(&diamond, &clip);
        let bbox = bounding_box(&clipped).unwrap();

        assert_relative_eq!(polygon_area(&clipped), 25.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.width(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.height(), 5.0, epsilon = 1e-9);
    }
}
