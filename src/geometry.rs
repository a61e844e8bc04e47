//! Geometry transforms applied by editing gestures.
//!
//! Every function here is pure: it takes the geometry as it was when the
//! gesture began plus the gesture input, and returns the new geometry. No
//! function reads or writes any other region. Results are always clamped into
//! the normalized `[0, 1]` image extent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::KeypointDefinition;
use crate::model::{
    BoxGeometry, ExpandingLineGeometry, KeypointsGeometry, Point, PolygonGeometry, Shape,
};

/// A box resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Direction {
    /// Whether this handle moves the top edge.
    pub fn moves_top(&self) -> bool {
        matches!(self, Direction::N | Direction::NE | Direction::NW)
    }

    /// Whether this handle moves the bottom edge.
    pub fn moves_bottom(&self) -> bool {
        matches!(self, Direction::S | Direction::SE | Direction::SW)
    }

    /// Whether this handle moves the left edge.
    pub fn moves_left(&self) -> bool {
        matches!(self, Direction::W | Direction::NW | Direction::SW)
    }

    /// Whether this handle moves the right edge.
    pub fn moves_right(&self) -> bool {
        matches!(self, Direction::E | Direction::NE | Direction::SE)
    }
}

/// Which edges a set of handles moves: (top, bottom, left, right).
fn active_edges(directions: &[Direction]) -> (bool, bool, bool, bool) {
    (
        directions.iter().any(Direction::moves_top),
        directions.iter().any(Direction::moves_bottom),
        directions.iter().any(Direction::moves_left),
        directions.iter().any(Direction::moves_right),
    )
}

/// Position of the grabbed handle on the box.
///
/// The cursor offset from this point drives the resize. Axes that no handle
/// touches use the box center.
pub fn handle_anchor(b: &BoxGeometry, directions: &[Direction]) -> Point {
    let (top, bottom, left, right) = active_edges(directions);
    let x = if left {
        b.x
    } else if right {
        b.right()
    } else {
        b.x + b.w / 2.0
    };
    let y = if top {
        b.y
    } else if bottom {
        b.bottom()
    } else {
        b.y + b.h / 2.0
    };
    Point::new(x, y)
}

/// Resize a box by dragging the given handles from `anchor` to `cursor`.
///
/// Only the edges named by the handles move. An edge dragged past its opposite
/// edge stops `min_size` short of it, so the box never flips. An empty handle
/// set moves the whole box instead.
pub fn resize_box(
    original: &BoxGeometry,
    directions: &[Direction],
    anchor: Point,
    cursor: Point,
    min_size: f64,
) -> BoxGeometry {
    if directions.is_empty() {
        return move_box(original, cursor.x - anchor.x, cursor.y - anchor.y);
    }

    let dx = cursor.x - anchor.x;
    let dy = cursor.y - anchor.y;
    let (top, bottom, left, right) = active_edges(directions);

    let mut x0 = original.x;
    let mut x1 = original.right();
    let mut y0 = original.y;
    let mut y1 = original.bottom();

    if left {
        x0 = (x0 + dx).min(x1 - min_size).max(0.0);
    }
    if right {
        x1 = (x1 + dx).max(x0 + min_size).min(1.0);
    }
    if top {
        y0 = (y0 + dy).min(y1 - min_size).max(0.0);
    }
    if bottom {
        y1 = (y1 + dy).max(y0 + min_size).min(1.0);
    }

    BoxGeometry::new(x0, y0, x1 - x0, y1 - y0)
}

/// Translate a box, keeping it entirely inside the image.
pub fn move_box(original: &BoxGeometry, dx: f64, dy: f64) -> BoxGeometry {
    BoxGeometry::new(
        (original.x + dx).clamp(0.0, (1.0 - original.w).max(0.0)),
        (original.y + dy).clamp(0.0, (1.0 - original.h).max(0.0)),
        original.w,
        original.h,
    )
}

/// Box spanned by a drag from `start` to `cursor`, at least `min_size` on each side.
pub fn drag_box(start: Point, cursor: Point, min_size: f64) -> BoxGeometry {
    let span = |a: f64, b: f64| {
        let (mut lo, mut hi) = (a.min(b).clamp(0.0, 1.0), a.max(b).clamp(0.0, 1.0));
        if hi - lo < min_size {
            hi = (lo + min_size).min(1.0);
            lo = hi - min_size;
        }
        (lo, hi)
    };
    let (x0, x1) = span(start.x, cursor.x);
    let (y0, y1) = span(start.y, cursor.y);
    BoxGeometry::new(x0, y0, x1 - x0, y1 - y0)
}

/// Translate any shape, limiting the offset so its bounding box stays inside the image.
pub fn translate_shape(shape: &Shape, dx: f64, dy: f64) -> Shape {
    let Some(bbox) = shape.bounding_box() else {
        return shape.clone();
    };
    let dx = dx.min(1.0 - bbox.right()).max(-bbox.x);
    let dy = dy.min(1.0 - bbox.bottom()).max(-bbox.y);
    let shift = |p: &Point| Point::new(p.x + dx, p.y + dy).clamped();

    match shape {
        Shape::Box(b) => Shape::Box(move_box(b, dx, dy)),
        Shape::Point(p) => Shape::Point(shift(p)),
        Shape::Polygon(poly) => Shape::Polygon(PolygonGeometry {
            points: poly.points.iter().map(shift).collect(),
            open: poly.open,
        }),
        Shape::Keypoints(kp) => Shape::Keypoints(KeypointsGeometry {
            keypoints_definition_id: kp.keypoints_definition_id.clone(),
            points: kp
                .points
                .iter()
                .map(|(name, p)| (name.clone(), p.as_ref().map(shift)))
                .collect(),
        }),
        Shape::ExpandingLine(line) => Shape::ExpandingLine(ExpandingLineGeometry {
            points: line.points.iter().map(shift).collect(),
            unfinished: line.unfinished,
            candidate_point: line.candidate_point.as_ref().map(shift),
        }),
    }
}

/// Perpendicular distance from `p` to the segment `a`-`b` (clamped to the segment).
pub fn distance_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * abx, a.y + t * aby))
}

/// Index at which a point should be inserted to split the edge nearest to it.
///
/// Edges of a closed polygon include the closing edge (inserting there means
/// appending after the last vertex). Ties go to the lowest index.
pub fn closest_edge_insert_index(points: &[Point], closed: bool, cursor: &Point) -> usize {
    if points.len() < 2 {
        return points.len();
    }

    let mut best_index = 1;
    let mut best_distance = f64::INFINITY;
    let edge_count = if closed && points.len() >= 3 {
        points.len()
    } else {
        points.len() - 1
    };

    for i in 0..edge_count {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        let d = distance_to_segment(cursor, a, b);
        if d < best_distance {
            best_distance = d;
            best_index = i + 1;
        }
    }
    best_index
}

/// Insert a vertex into a polygon.
///
/// With `index` the vertex goes exactly there; without it the nearest edge is
/// split. Returns `None` when `index` is past the end of the vertex list.
pub fn insert_polygon_point(
    polygon: &PolygonGeometry,
    point: Point,
    index: Option<usize>,
) -> Option<PolygonGeometry> {
    let point = point.clamped();
    let index = match index {
        Some(i) if i > polygon.points.len() => return None,
        Some(i) => i,
        None => closest_edge_insert_index(&polygon.points, !polygon.open, &point),
    };
    let mut points = polygon.points.clone();
    points.insert(index, point);
    Some(PolygonGeometry {
        points,
        open: polygon.open,
    })
}

/// Move a single polygon vertex. Returns `None` for an invalid index.
pub fn move_polygon_point(
    polygon: &PolygonGeometry,
    index: usize,
    cursor: Point,
) -> Option<PolygonGeometry> {
    if index >= polygon.points.len() {
        return None;
    }
    let mut points = polygon.points.clone();
    points[index] = cursor.clamped();
    Some(PolygonGeometry {
        points,
        open: polygon.open,
    })
}

/// Move a single named keypoint. Returns `None` if the name is unknown.
pub fn move_keypoint(
    keypoints: &KeypointsGeometry,
    name: &str,
    cursor: Point,
) -> Option<KeypointsGeometry> {
    if !keypoints.points.contains_key(name) {
        return None;
    }
    let mut moved = keypoints.clone();
    moved.points.insert(name.to_string(), Some(cursor.clamped()));
    Some(moved)
}

/// Append a point to the tail of an expanding line.
pub fn append_line_point(line: &ExpandingLineGeometry, point: Point) -> ExpandingLineGeometry {
    let mut points = line.points.clone();
    points.push(point.clamped());
    ExpandingLineGeometry {
        points,
        unfinished: line.unfinished,
        candidate_point: None,
    }
}

/// Place every landmark of a keypoint definition around `center`.
pub fn place_keypoints(
    definition: &KeypointDefinition,
    center: Point,
    scale: f64,
) -> BTreeMap<String, Option<Point>> {
    definition
        .landmarks
        .iter()
        .map(|(name, landmark)| {
            let offset = landmark.default_position;
            let p = Point::new(center.x + offset.x * scale, center.y + offset.y * scale);
            (name.clone(), Some(p.clamped()))
        })
        .collect()
}

/// Scale that puts the outermost landmark at the cursor distance from `center`.
pub fn keypoint_scale(definition: &KeypointDefinition, center: Point, cursor: Point) -> f64 {
    let reference = definition
        .landmarks
        .values()
        .map(|l| l.default_position.distance_to(&Point::default()))
        .fold(0.0, f64::max);
    if reference <= 0.0 {
        return 1.0;
    }
    center.distance_to(&cursor) / reference
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Landmark;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn square() -> PolygonGeometry {
        PolygonGeometry {
            points: vec![
                Point::new(0.2, 0.2),
                Point::new(0.6, 0.2),
                Point::new(0.6, 0.6),
                Point::new(0.2, 0.6),
            ],
            open: false,
        }
    }

    #[test]
    fn test_se_resize_grows_right_and_bottom() {
        let b = BoxGeometry::new(0.25, 0.25, 0.5, 0.5);
        let anchor = handle_anchor(&b, &[Direction::SE]);
        assert!(approx_eq(anchor.x, 0.75) && approx_eq(anchor.y, 0.75));

        let out = resize_box(&b, &[Direction::SE], anchor, Point::new(0.85, 0.85), 0.001);
        assert!(approx_eq(out.x, 0.25));
        assert!(approx_eq(out.y, 0.25));
        assert!(approx_eq(out.w, 0.6));
        assert!(approx_eq(out.h, 0.6));
    }

    #[test]
    fn test_w_resize_keeps_right_edge() {
        let b = BoxGeometry::new(0.4, 0.4, 0.2, 0.2);
        let anchor = handle_anchor(&b, &[Direction::W]);
        let out = resize_box(&b, &[Direction::W], anchor, Point::new(0.3, 0.9), 0.001);
        assert!(approx_eq(out.x, 0.3));
        assert!(approx_eq(out.right(), 0.6));
        // Vertical cursor movement is ignored for a pure W handle
        assert!(approx_eq(out.y, 0.4) && approx_eq(out.h, 0.2));
    }

    #[test]
    fn test_crossing_opposite_edge_pins_to_min_size() {
        let b = BoxGeometry::new(0.4, 0.4, 0.2, 0.2);
        let anchor = handle_anchor(&b, &[Direction::E]);
        let out = resize_box(&b, &[Direction::E], anchor, Point::new(0.1, 0.5), 0.01);
        assert!(approx_eq(out.x, 0.4));
        assert!(approx_eq(out.w, 0.01));

        let anchor = handle_anchor(&b, &[Direction::N]);
        let out = resize_box(&b, &[Direction::N], anchor, Point::new(0.5, 0.95), 0.01);
        assert!(approx_eq(out.bottom(), 0.6));
        assert!(approx_eq(out.h, 0.01));
    }

    #[test]
    fn test_resize_clamps_to_image() {
        let b = BoxGeometry::new(0.5, 0.5, 0.3, 0.3);
        let anchor = handle_anchor(&b, &[Direction::SE]);
        let out = resize_box(&b, &[Direction::SE], anchor, Point::new(1.4, 1.2), 0.001);
        assert!(approx_eq(out.right(), 1.0));
        assert!(approx_eq(out.bottom(), 1.0));
    }

    #[test]
    fn test_empty_directions_move_box() {
        let b = BoxGeometry::new(0.1, 0.1, 0.2, 0.2);
        let out = resize_box(&b, &[], Point::new(0.2, 0.2), Point::new(0.3, 0.25), 0.001);
        assert!(approx_eq(out.x, 0.2) && approx_eq(out.y, 0.15));
        assert!(approx_eq(out.w, 0.2) && approx_eq(out.h, 0.2));

        let out = move_box(&b, 5.0, -5.0);
        assert!(approx_eq(out.x, 0.8) && approx_eq(out.y, 0.0));
    }

    #[test]
    fn test_insert_splits_nearest_edge() {
        let poly = square();
        // Near the right edge (between vertex 1 and 2)
        let out = insert_polygon_point(&poly, Point::new(0.65, 0.4), None).expect("insert");
        assert_eq!(out.points.len(), 5);
        assert_eq!(out.points[2], Point::new(0.65, 0.4));

        // Near the closing edge (between vertex 3 and 0) appends at the end
        let out = insert_polygon_point(&poly, Point::new(0.15, 0.4), None).expect("insert");
        assert_eq!(out.points[4], Point::new(0.15, 0.4));
    }

    #[test]
    fn test_open_polygon_ignores_closing_edge() {
        let mut poly = square();
        poly.open = true;
        let index = closest_edge_insert_index(&poly.points, false, &Point::new(0.15, 0.5));
        // Closest open edge is 2-3 (bottom), not the missing closing edge
        assert_eq!(index, 3);
    }

    #[test]
    fn test_insert_with_explicit_index() {
        let poly = square();
        let out = insert_polygon_point(&poly, Point::new(0.9, 0.9), Some(0)).expect("insert");
        assert_eq!(out.points[0], Point::new(0.9, 0.9));
        assert!(insert_polygon_point(&poly, Point::new(0.9, 0.9), Some(9)).is_none());
    }

    #[test]
    fn test_move_polygon_point_only_touches_one_vertex() {
        let poly = square();
        let out = move_polygon_point(&poly, 1, Point::new(1.5, 0.1)).expect("valid index");
        assert_eq!(out.points[1], Point::new(1.0, 0.1));
        assert_eq!(out.points[0], poly.points[0]);
        assert_eq!(out.points[2], poly.points[2]);
        assert!(move_polygon_point(&poly, 4, Point::new(0.1, 0.1)).is_none());
    }

    #[test]
    fn test_move_keypoint() {
        let mut points = BTreeMap::new();
        points.insert("head".to_string(), Some(Point::new(0.5, 0.1)));
        points.insert("foot".to_string(), None);
        let kp = KeypointsGeometry {
            keypoints_definition_id: "human".to_string(),
            points,
        };

        let out = move_keypoint(&kp, "foot", Point::new(0.5, 0.9)).expect("known keypoint");
        assert_eq!(out.points["foot"], Some(Point::new(0.5, 0.9)));
        assert_eq!(out.points["head"], Some(Point::new(0.5, 0.1)));
        assert!(move_keypoint(&kp, "tail", Point::new(0.5, 0.9)).is_none());
    }

    #[test]
    fn test_append_line_point_only_at_tail() {
        let line = ExpandingLineGeometry {
            points: vec![Point::new(0.1, 0.1)],
            unfinished: true,
            candidate_point: Some(Point::new(0.3, 0.3)),
        };
        let out = append_line_point(&line, Point::new(0.2, 0.2));
        assert_eq!(out.points, vec![Point::new(0.1, 0.1), Point::new(0.2, 0.2)]);
        assert!(out.candidate_point.is_none());
    }

    #[test]
    fn test_translate_polygon_clamps_offset() {
        let shape = Shape::Polygon(square());
        let Shape::Polygon(out) = translate_shape(&shape, 0.9, 0.0) else {
            panic!("Expected polygon");
        };
        // Right edge was at 0.6, so the offset is limited to 0.4
        assert!(approx_eq(out.points[1].x, 1.0));
        assert!(approx_eq(out.points[0].x, 0.6));
    }

    #[test]
    fn test_place_and_scale_keypoints() {
        let mut landmarks = BTreeMap::new();
        landmarks.insert("head".to_string(), Landmark::at(0.0, -0.1));
        landmarks.insert("foot".to_string(), Landmark::at(0.0, 0.2));
        let definition = KeypointDefinition {
            landmarks,
            connections: Vec::new(),
        };

        let center = Point::new(0.5, 0.5);
        let scale = keypoint_scale(&definition, center, Point::new(0.5, 0.9));
        assert!(approx_eq(scale, 2.0));

        let placed = place_keypoints(&definition, center, scale);
        let head = placed["head"].expect("placed");
        let foot = placed["foot"].expect("placed");
        assert!(approx_eq(head.y, 0.3));
        assert!(approx_eq(foot.y, 0.9));
    }

    #[test]
    fn test_drag_box_any_direction_with_minimum() {
        let b = drag_box(Point::new(0.6, 0.7), Point::new(0.2, 0.3), 0.001);
        assert!(approx_eq(b.x, 0.2));
        assert!(approx_eq(b.y, 0.3));
        assert!(approx_eq(b.w, 0.4));
        assert!(approx_eq(b.h, 0.4));

        // A click at the far corner still yields a valid box inside the image
        let tiny = drag_box(Point::new(1.0, 1.0), Point::new(1.0, 1.0), 0.01);
        assert!(approx_eq(tiny.w, 0.01));
        assert!(approx_eq(tiny.right(), 1.0));
        assert!(Shape::Box(tiny).validate().is_ok());
    }
}
