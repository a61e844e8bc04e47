//! The in-progress gesture descriptor.

use std::sync::Arc;

use serde::Serialize;

use super::AnnotationState;
use crate::geometry::Direction;
use crate::model::{BoxGeometry, Point, RegionId, Shape, Tool};
use crate::view::Viewport;

/// State captured when a gesture began, used to discard it.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// The state before the gesture (also the history entry it pushed, if any)
    pub before: Arc<AnnotationState>,
}

/// Partial geometry of a region (or allowed area) being created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Partial {
    /// Box dragged from `start` to the cursor
    Box { start: Point },
    /// Polygon drawn click by click; `preview` follows the cursor
    Polygon { preview: Option<Point> },
    /// Expanding line drawn click by click
    ExpandingLine,
    /// Skeleton placed at `center`, scaled by dragging
    Keypoints { center: Point, definition_id: String },
    /// Allowed-area box dragged from `start`
    AllowedArea { start: Point },
}

/// An edit of an existing region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Transform {
    /// Box handles dragged from `anchor`; without an anchor the first move sets it
    ResizeBox {
        original: BoxGeometry,
        directions: Vec<Direction>,
        anchor: Option<Point>,
    },
    /// Whole region dragged from `anchor`
    MoveRegion { anchor: Point },
    MovePolygonPoint { point_index: usize },
    MoveKeypoint { keypoint_id: String },
    MovePoint,
}

impl Transform {
    /// History entry name for this transform.
    pub fn name(&self) -> &'static str {
        match self {
            Transform::ResizeBox { directions, .. } if directions.is_empty() => "Move Box",
            Transform::ResizeBox { .. } => "Resize Box",
            Transform::MoveRegion { .. } => "Move Region",
            Transform::MovePolygonPoint { .. } => "Move Polygon Point",
            Transform::MoveKeypoint { .. } => "Move Keypoint",
            Transform::MovePoint => "Move Point",
        }
    }
}

/// What the pointer is currently doing.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Mode {
    #[default]
    Idle,
    Creating {
        tool: Tool,
        /// The region being created (none for the allowed area)
        region_id: Option<RegionId>,
        partial: Partial,
        #[serde(skip)]
        checkpoint: Checkpoint,
    },
    Transforming {
        region_id: RegionId,
        /// Geometry when the transform began
        original: Shape,
        transform: Transform,
        #[serde(skip)]
        checkpoint: Checkpoint,
    },
    Panning {
        start: Point,
        start_view: Viewport,
    },
    Zooming {
        start: Point,
        current: Point,
    },
}

impl Mode {
    pub fn is_idle(&self) -> bool {
        matches!(self, Mode::Idle)
    }

    /// Region the gesture is working on, if any.
    pub fn region_id(&self) -> Option<&RegionId> {
        match self {
            Mode::Creating { region_id, .. } => region_id.as_ref(),
            Mode::Transforming { region_id, .. } => Some(region_id),
            Mode::Idle | Mode::Panning { .. } | Mode::Zooming { .. } => None,
        }
    }

    /// Checkpoint of an annotation gesture.
    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        match self {
            Mode::Creating { checkpoint, .. } | Mode::Transforming { checkpoint, .. } => {
                Some(checkpoint)
            }
            Mode::Idle | Mode::Panning { .. } | Mode::Zooming { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serialization() {
        let mode = Mode::Panning {
            start: Point::new(0.5, 0.5),
            start_view: Viewport::identity(),
        };
        let json = serde_json::to_value(&mode).expect("serialize");
        assert_eq!(json["mode"], "panning");
        assert_eq!(json["startView"]["zoom"], 1.0);

        let idle = serde_json::to_value(Mode::Idle).expect("serialize");
        assert_eq!(idle["mode"], "idle");
    }

    #[test]
    fn test_transform_names() {
        let resize = Transform::ResizeBox {
            original: BoxGeometry::new(0.1, 0.1, 0.1, 0.1),
            directions: vec![],
            anchor: None,
        };
        assert_eq!(resize.name(), "Move Box");
        assert_eq!(Transform::MovePoint.name(), "Move Point");
    }
}
