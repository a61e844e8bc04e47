//! Region types: the annotated geometric entities on an image or frame.
//!
//! All coordinates are normalized to `[0, 1]` relative to the image extent.
//! Regions coming from outside the engine go through [`Region::from_json`] or
//! [`Region::validate`]; nothing out of range is ever coerced into the state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RegionError;

/// Tolerance used when checking that a box's far edge stays within the image.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Hit radius for point-like shapes (normalized).
pub const POINT_HIT_RADIUS: f64 = 0.01;

/// Minimum number of vertices of a closed polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Unique identifier of a region within one image.
///
/// Hosts use both numeric and string ids, so both are accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionId {
    /// Numeric id (also what the engine generates for new regions)
    Number(u64),
    /// Host-provided string id
    Text(String),
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::Number(n) => write!(f, "{}", n),
            RegionId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for RegionId {
    fn from(n: u64) -> Self {
        RegionId::Number(n)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        RegionId::Text(s.to_string())
    }
}

/// A 2D point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// This point with both coordinates clamped into `[0, 1]`.
    pub fn clamped(&self) -> Point {
        Point::new(self.x.clamp(0.0, 1.0), self.y.clamp(0.0, 1.0))
    }

    /// Linear interpolation towards `other` (`alpha` = 0 gives `self`).
    pub fn lerp(&self, other: &Point, alpha: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * alpha,
            self.y + (other.y - self.y) * alpha,
        )
    }
}

/// An axis-aligned box: top-left corner plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxGeometry {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoxGeometry {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Create a box spanning two corner points, in any order.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let x = p1.x.min(p2.x);
        let y = p1.y.min(p2.y);
        Self {
            x,
            y,
            w: (p1.x - p2.x).abs(),
            h: (p1.y - p2.y).abs(),
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Check if a point is inside the box (edges included).
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

/// Polygon vertices; `open` while the polygon is still being drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonGeometry {
    pub points: Vec<Point>,
    #[serde(default)]
    pub open: bool,
}

/// A keypoint skeleton: named keypoints, `None` when not visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeypointsGeometry {
    /// Which configured keypoint definition this skeleton follows.
    #[serde(default)]
    pub keypoints_definition_id: String,
    pub points: BTreeMap<String, Option<Point>>,
}

/// A polyline that only grows at its tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandingLineGeometry {
    pub points: Vec<Point>,
    /// Still being drawn.
    #[serde(default)]
    pub unfinished: bool,
    /// Cursor preview shown after the last point; never part of `points`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_point: Option<Point>,
}

/// The geometry of a region, tagged by `type` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Shape {
    Box(BoxGeometry),
    Point(Point),
    Polygon(PolygonGeometry),
    Keypoints(KeypointsGeometry),
    ExpandingLine(ExpandingLineGeometry),
}

impl Shape {
    /// Variant name as used in JSON.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Box(_) => "box",
            Shape::Point(_) => "point",
            Shape::Polygon(_) => "polygon",
            Shape::Keypoints(_) => "keypoints",
            Shape::ExpandingLine(_) => "expanding-line",
        }
    }

    /// Check whether two shapes are the same variant.
    pub fn same_kind(&self, other: &Shape) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// All coordinates of the shape, tagged with a field name for error reporting.
    fn coordinates(&self) -> Vec<(String, f64)> {
        fn push_point(out: &mut Vec<(String, f64)>, prefix: &str, p: &Point) {
            out.push((format!("{}.x", prefix), p.x));
            out.push((format!("{}.y", prefix), p.y));
        }

        let mut out = Vec::new();
        match self {
            Shape::Box(b) => {
                out.push(("x".to_string(), b.x));
                out.push(("y".to_string(), b.y));
                out.push(("w".to_string(), b.w));
                out.push(("h".to_string(), b.h));
            }
            Shape::Point(p) => push_point(&mut out, "point", p),
            Shape::Polygon(poly) => {
                for (i, p) in poly.points.iter().enumerate() {
                    push_point(&mut out, &format!("points[{}]", i), p);
                }
            }
            Shape::Keypoints(kp) => {
                let visible = kp.points.iter().filter_map(|(n, p)| p.as_ref().map(|p| (n, p)));
                for (name, p) in visible {
                    push_point(&mut out, &format!("points.{}", name), p);
                }
            }
            Shape::ExpandingLine(line) => {
                for (i, p) in line.points.iter().enumerate() {
                    push_point(&mut out, &format!("points[{}]", i), p);
                }
                if let Some(p) = &line.candidate_point {
                    push_point(&mut out, "candidatePoint", p);
                }
            }
        }
        out
    }

    /// Validate coordinate ranges and shape-specific structure.
    pub fn validate(&self) -> Result<(), RegionError> {
        for (field, value) in self.coordinates() {
            if !value.is_finite() {
                return Err(RegionError::NonFinite { field });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(RegionError::CoordinateOutOfRange { field, value });
            }
        }

        match self {
            Shape::Box(b) => {
                if b.w <= 0.0 || b.h <= 0.0 {
                    return Err(RegionError::DegenerateBox { w: b.w, h: b.h });
                }
                if b.right() > 1.0 + EDGE_TOLERANCE {
                    return Err(RegionError::CoordinateOutOfRange {
                        field: "x+w".to_string(),
                        value: b.right(),
                    });
                }
                if b.bottom() > 1.0 + EDGE_TOLERANCE {
                    return Err(RegionError::CoordinateOutOfRange {
                        field: "y+h".to_string(),
                        value: b.bottom(),
                    });
                }
            }
            Shape::Polygon(poly) => {
                let min = if poly.open { 1 } else { MIN_POLYGON_VERTICES };
                if poly.points.len() < min {
                    return Err(RegionError::TooFewPolygonPoints {
                        count: poly.points.len(),
                    });
                }
            }
            Shape::ExpandingLine(line) => {
                if line.points.is_empty() {
                    return Err(RegionError::EmptyExpandingLine);
                }
            }
            Shape::Point(_) | Shape::Keypoints(_) => {}
        }
        Ok(())
    }

    /// Get the bounding box of this shape, if it has any visible point.
    pub fn bounding_box(&self) -> Option<BoxGeometry> {
        let points: Vec<Point> = match self {
            Shape::Box(b) => return Some(*b),
            Shape::Point(p) => vec![*p],
            Shape::Polygon(poly) => poly.points.clone(),
            Shape::Keypoints(kp) => kp.points.values().flatten().copied().collect(),
            Shape::ExpandingLine(line) => line.points.clone(),
        };
        let first = points.first()?;

        let mut min = *first;
        let mut max = *first;
        for p in &points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(BoxGeometry::from_corners(min, max))
    }

    /// Check if a point hits this shape.
    pub fn contains_point(&self, point: &Point) -> bool {
        match self {
            Shape::Box(b) => b.contains(point),
            Shape::Point(p) => p.distance_to(point) < POINT_HIT_RADIUS,
            Shape::Polygon(poly) => {
                // Point-in-polygon test using ray casting algorithm
                let vertices = &poly.points;
                if poly.open || vertices.len() < MIN_POLYGON_VERTICES {
                    return false;
                }
                let mut inside = false;
                let mut j = vertices.len() - 1;
                for i in 0..vertices.len() {
                    let vi = &vertices[i];
                    let vj = &vertices[j];
                    if ((vi.y > point.y) != (vj.y > point.y))
                        && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
                    {
                        inside = !inside;
                    }
                    j = i;
                }
                inside
            }
            Shape::Keypoints(kp) => kp
                .points
                .values()
                .flatten()
                .any(|p| p.distance_to(point) < POINT_HIT_RADIUS),
            Shape::ExpandingLine(line) => line.points.windows(2).any(|seg| {
                crate::geometry::distance_to_segment(point, &seg[0], &seg[1]) < POINT_HIT_RADIUS
            }),
        }
    }
}

fn default_color() -> String {
    "#ff0000".to_string()
}

fn default_visible() -> bool {
    true
}

/// One annotated region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: RegionId,
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default = "default_color")]
    pub color: String,
    /// Class label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Editing-focus marker set by the region editor.
    #[serde(default)]
    pub editing_labels: bool,
}

impl Region {
    /// Create a visible, unlabelled region.
    pub fn new(id: impl Into<RegionId>, shape: Shape, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            shape,
            color: color.into(),
            cls: None,
            tags: BTreeSet::new(),
            highlighted: false,
            locked: false,
            visible: true,
            editing_labels: false,
        }
    }

    /// Set the class label.
    pub fn with_cls(mut self, cls: impl Into<String>) -> Self {
        self.cls = Some(cls.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Variant name as used in JSON.
    pub fn kind(&self) -> &'static str {
        self.shape.kind()
    }

    /// Validate the region's id and geometry.
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.id == RegionId::Number(u64::MAX) {
            return Err(RegionError::ReservedId(u64::MAX));
        }
        self.shape.validate()
    }

    /// Parse and validate a region from JSON.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RegionError> {
        let region: Region =
            serde_json::from_value(value).map_err(|e| RegionError::malformed(e.to_string()))?;
        region.validate()?;
        Ok(region)
    }
}

/// Check a region set for per-region validity and id uniqueness.
pub fn validate_region_set(regions: &[Region]) -> Result<(), RegionError> {
    let mut seen = BTreeSet::new();
    for region in regions {
        region.validate()?;
        if !seen.insert(&region.id) {
            return Err(RegionError::DuplicateId(region.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_box_json_shape() {
        let region = Region::from_json(json!({
            "type": "box", "id": 222, "x": 0.25, "y": 0.25, "w": 0.5, "h": 0.5, "color": "#00f"
        }))
        .expect("valid box");

        assert_eq!(region.id, RegionId::Number(222));
        assert_eq!(region.shape, Shape::Box(BoxGeometry::new(0.25, 0.25, 0.5, 0.5)));
        assert!(region.visible);
        assert!(!region.locked);

        let back = serde_json::to_value(&region).expect("serialize");
        assert_eq!(back["type"], "box");
        assert_eq!(back["w"], 0.5);
    }

    #[test]
    fn test_string_ids_and_kebab_case_kind() {
        let region = Region::from_json(json!({
            "type": "expanding-line", "id": "abc", "points": [{"x": 0.1, "y": 0.2}]
        }))
        .expect("valid line");
        assert_eq!(region.id, RegionId::from("abc"));
        assert_eq!(region.kind(), "expanding-line");
    }

    #[test]
    fn test_missing_id_rejected() {
        let err = Region::from_json(json!({"type": "point", "x": 0.1, "y": 0.1})).unwrap_err();
        assert_matches!(err, RegionError::Malformed { .. });
    }

    #[test]
    fn test_out_of_range_rejected_not_coerced() {
        let err = Region::from_json(json!({"type": "point", "id": 1, "x": 1.5, "y": 0.1}))
            .unwrap_err();
        assert_matches!(err, RegionError::CoordinateOutOfRange { value, .. } if value == 1.5);

        let err = Region::from_json(json!({
            "type": "box", "id": 1, "x": 0.8, "y": 0.1, "w": 0.5, "h": 0.1
        }))
        .unwrap_err();
        assert_matches!(err, RegionError::CoordinateOutOfRange { .. });
    }

    #[test]
    fn test_degenerate_shapes_rejected() {
        let err = Region::from_json(json!({
            "type": "box", "id": 1, "x": 0.1, "y": 0.1, "w": 0.0, "h": 0.1
        }))
        .unwrap_err();
        assert_matches!(err, RegionError::DegenerateBox { .. });

        let err = Region::from_json(json!({
            "type": "polygon", "id": 1, "points": [{"x": 0.1, "y": 0.1}, {"x": 0.2, "y": 0.2}]
        }))
        .unwrap_err();
        assert_matches!(err, RegionError::TooFewPolygonPoints { count: 2 });

        let err = Region::from_json(json!({"type": "expanding-line", "id": 1, "points": []}))
            .unwrap_err();
        assert_eq!(err, RegionError::EmptyExpandingLine);
    }

    #[test]
    fn test_keypoints_allow_missing_points() {
        let region = Region::from_json(json!({
            "type": "keypoints", "id": 9, "keypointsDefinitionId": "human",
            "points": {"head": {"x": 0.5, "y": 0.1}, "tail": null}
        }))
        .expect("valid keypoints");
        let Shape::Keypoints(kp) = &region.shape else {
            panic!("Expected keypoints shape");
        };
        assert_eq!(kp.points["tail"], None);
        assert_eq!(kp.points["head"], Some(Point::new(0.5, 0.1)));
    }

    #[test]
    fn test_region_set_duplicate_ids() {
        let a = Region::new(1, Shape::Point(Point::new(0.1, 0.1)), "#fff");
        let b = Region::new(1, Shape::Point(Point::new(0.2, 0.2)), "#fff");
        assert_eq!(
            validate_region_set(&[a.clone(), b]),
            Err(RegionError::DuplicateId(RegionId::Number(1)))
        );
        assert!(validate_region_set(&[a]).is_ok());
    }

    #[test]
    fn test_polygon_contains() {
        let square = Shape::Polygon(PolygonGeometry {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(0.5, 0.0),
                Point::new(0.5, 0.5),
                Point::new(0.0, 0.5),
            ],
            open: false,
        });
        assert!(square.contains_point(&Point::new(0.25, 0.25)));
        assert!(!square.contains_point(&Point::new(0.75, 0.25)));
    }

    #[test]
    fn test_bounding_box_of_keypoints_skips_hidden() {
        let mut points = BTreeMap::new();
        points.insert("a".to_string(), Some(Point::new(0.2, 0.3)));
        points.insert("b".to_string(), Some(Point::new(0.6, 0.1)));
        points.insert("c".to_string(), None);
        let shape = Shape::Keypoints(KeypointsGeometry {
            keypoints_definition_id: "x".to_string(),
            points,
        });
        let bbox = shape.bounding_box().expect("has points");
        assert!((bbox.x - 0.2).abs() < 1e-12);
        assert!((bbox.y - 0.1).abs() < 1e-12);
        assert!((bbox.w - 0.4).abs() < 1e-12);
        assert!((bbox.h - 0.2).abs() < 1e-12);
    }
}
