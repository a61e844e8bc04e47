//! Actions: the only way to change an [`AnnotationState`](crate::AnnotationState).
//!
//! JSON form is `{ "type": "<TAG>", ...fields }` with camelCase fields, e.g.
//! `{"type": "SELECT_REGION", "regionId": 3}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ActionError;
use crate::geometry::Direction;
use crate::model::{Point, Region, RegionId, Tool};

/// Asset-load completion reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedMetadata {
    pub natural_width: f64,
    pub natural_height: f64,
    /// Video length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Header buttons the engine reacts to. Other names are only recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderButton {
    Prev,
    Next,
    Play,
    Pause,
    /// Copy the active image's regions to the next, still empty, image
    Clone,
    Settings,
    Fullscreen,
    Window,
    Save,
}

impl HeaderButton {
    /// Parse a button name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let button = match name.to_ascii_lowercase().as_str() {
            "prev" => HeaderButton::Prev,
            "next" => HeaderButton::Next,
            "play" => HeaderButton::Play,
            "pause" => HeaderButton::Pause,
            "clone" => HeaderButton::Clone,
            "settings" => HeaderButton::Settings,
            "fullscreen" => HeaderButton::Fullscreen,
            "window" => HeaderButton::Window,
            "save" => HeaderButton::Save,
            _ => return None,
        };
        Some(button)
    }
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    SelectTool {
        selected_tool: Tool,
    },
    MouseDown {
        x: f64,
        y: f64,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    MouseUp {
        x: f64,
        y: f64,
    },
    BeginBoxTransform {
        region_id: RegionId,
        /// Handles being dragged; empty moves the whole box
        #[serde(default)]
        directions: Vec<Direction>,
    },
    BeginMovePolygonPoint {
        region_id: RegionId,
        point_index: usize,
    },
    BeginMoveKeypoint {
        region_id: RegionId,
        keypoint_id: String,
    },
    BeginMovePoint {
        region_id: RegionId,
    },
    AddPolygonPoint {
        region_id: RegionId,
        point: Point,
        /// Insert exactly here instead of splitting the nearest edge
        #[serde(default)]
        point_index: Option<usize>,
    },
    SelectRegion {
        #[serde(default)]
        region_id: Option<RegionId>,
    },
    ChangeRegion {
        region: Region,
    },
    UpdateRegions {
        regions: Vec<Region>,
    },
    DeleteRegion {
        region_id: RegionId,
    },
    OpenRegionEditor {
        region_id: RegionId,
    },
    CloseRegionEditor {
        region_id: RegionId,
    },
    ChangeImage {
        delta: i64,
    },
    SelectImage {
        image_index: usize,
    },
    ChangeVideoTime {
        new_time: f64,
    },
    ChangeVideoPlaying {
        is_playing: bool,
    },
    DeleteKeyframe {
        time: f64,
        /// Only this region's keyframe; all regions when absent
        #[serde(default)]
        region_id: Option<RegionId>,
    },
    RestoreHistory {
        index: usize,
    },
    RedoHistory,
    HeaderButtonClicked {
        button_name: String,
    },
    ImageOrVideoLoaded {
        metadata: LoadedMetadata,
    },
    LinkResource {
        region_id: RegionId,
    },
    Cancel,
}

impl Action {
    /// Every action tag, as used in JSON.
    pub const TAGS: &'static [&'static str] = &[
        "SELECT_TOOL",
        "MOUSE_DOWN",
        "MOUSE_MOVE",
        "MOUSE_UP",
        "BEGIN_BOX_TRANSFORM",
        "BEGIN_MOVE_POLYGON_POINT",
        "BEGIN_MOVE_KEYPOINT",
        "BEGIN_MOVE_POINT",
        "ADD_POLYGON_POINT",
        "SELECT_REGION",
        "CHANGE_REGION",
        "UPDATE_REGIONS",
        "DELETE_REGION",
        "OPEN_REGION_EDITOR",
        "CLOSE_REGION_EDITOR",
        "CHANGE_IMAGE",
        "SELECT_IMAGE",
        "CHANGE_VIDEO_TIME",
        "CHANGE_VIDEO_PLAYING",
        "DELETE_KEYFRAME",
        "RESTORE_HISTORY",
        "REDO_HISTORY",
        "HEADER_BUTTON_CLICKED",
        "IMAGE_OR_VIDEO_LOADED",
        "LINK_RESOURCE",
        "CANCEL",
    ];

    /// The JSON tag of this action.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::SelectTool { .. } => "SELECT_TOOL",
            Action::MouseDown { .. } => "MOUSE_DOWN",
            Action::MouseMove { .. } => "MOUSE_MOVE",
            Action::MouseUp { .. } => "MOUSE_UP",
            Action::BeginBoxTransform { .. } => "BEGIN_BOX_TRANSFORM",
            Action::BeginMovePolygonPoint { .. } => "BEGIN_MOVE_POLYGON_POINT",
            Action::BeginMoveKeypoint { .. } => "BEGIN_MOVE_KEYPOINT",
            Action::BeginMovePoint { .. } => "BEGIN_MOVE_POINT",
            Action::AddPolygonPoint { .. } => "ADD_POLYGON_POINT",
            Action::SelectRegion { .. } => "SELECT_REGION",
            Action::ChangeRegion { .. } => "CHANGE_REGION",
            Action::UpdateRegions { .. } => "UPDATE_REGIONS",
            Action::DeleteRegion { .. } => "DELETE_REGION",
            Action::OpenRegionEditor { .. } => "OPEN_REGION_EDITOR",
            Action::CloseRegionEditor { .. } => "CLOSE_REGION_EDITOR",
            Action::ChangeImage { .. } => "CHANGE_IMAGE",
            Action::SelectImage { .. } => "SELECT_IMAGE",
            Action::ChangeVideoTime { .. } => "CHANGE_VIDEO_TIME",
            Action::ChangeVideoPlaying { .. } => "CHANGE_VIDEO_PLAYING",
            Action::DeleteKeyframe { .. } => "DELETE_KEYFRAME",
            Action::RestoreHistory { .. } => "RESTORE_HISTORY",
            Action::RedoHistory => "REDO_HISTORY",
            Action::HeaderButtonClicked { .. } => "HEADER_BUTTON_CLICKED",
            Action::ImageOrVideoLoaded { .. } => "IMAGE_OR_VIDEO_LOADED",
            Action::LinkResource { .. } => "LINK_RESOURCE",
            Action::Cancel => "CANCEL",
        }
    }

    /// Parse one action from JSON.
    ///
    /// Unknown tags give [`ActionError::UnknownAction`]; a known tag with a bad
    /// payload gives [`ActionError::MalformedAction`].
    pub fn from_json(value: &Value) -> Result<Self, ActionError> {
        let Some(tag) = value.get("type").and_then(Value::as_str) else {
            return Err(ActionError::MalformedAction {
                tag: String::new(),
                message: "missing string field `type`".to_string(),
            });
        };
        if !Self::TAGS.contains(&tag) {
            return Err(ActionError::UnknownAction(tag.to_string()));
        }
        serde_json::from_value(value.clone()).map_err(|e| ActionError::MalformedAction {
            tag: tag.to_string(),
            message: e.to_string(),
        })
    }

    /// Parse one action from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ActionError> {
        let value: Value = serde_json::from_str(json).map_err(|e| ActionError::MalformedAction {
            tag: String::new(),
            message: e.to_string(),
        })?;
        Self::from_json(&value)
    }

    /// Actions that never change annotations and never enter history.
    ///
    /// Mouse actions are not listed: whether they mutate depends on the tool.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Action::ChangeImage { .. }
                | Action::SelectImage { .. }
                | Action::ChangeVideoTime { .. }
                | Action::ChangeVideoPlaying { .. }
                | Action::SelectTool { .. }
                | Action::SelectRegion { .. }
                | Action::HeaderButtonClicked { .. }
                | Action::OpenRegionEditor { .. }
                | Action::CloseRegionEditor { .. }
                | Action::LinkResource { .. }
                | Action::ImageOrVideoLoaded { .. }
                | Action::Cancel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_parse_with_camel_case_fields() {
        let action = Action::from_json(&json!({
            "type": "BEGIN_BOX_TRANSFORM", "regionId": 1, "directions": ["SE"]
        }))
        .expect("valid action");
        assert_eq!(
            action,
            Action::BeginBoxTransform {
                region_id: RegionId::Number(1),
                directions: vec![Direction::SE],
            }
        );
    }

    #[test]
    fn test_unit_and_optional_fields() {
        assert_eq!(
            Action::from_json(&json!({"type": "CANCEL"})).expect("cancel"),
            Action::Cancel
        );
        assert_eq!(
            Action::from_json(&json!({"type": "SELECT_REGION", "regionId": null}))
                .expect("deselect"),
            Action::SelectRegion { region_id: None }
        );
        assert_eq!(
            Action::from_json_str(r#"{"type": "SELECT_TOOL", "selectedTool": "create-box"}"#)
                .expect("select tool"),
            Action::SelectTool {
                selected_tool: Tool::CreateBox
            }
        );
    }

    #[test]
    fn test_unknown_vs_malformed() {
        assert_eq!(
            Action::from_json(&json!({"type": "FLY_AWAY"})),
            Err(ActionError::UnknownAction("FLY_AWAY".to_string()))
        );
        assert_matches!(
            Action::from_json(&json!({"type": "MOUSE_DOWN", "x": "left"})),
            Err(ActionError::MalformedAction { tag, .. }) if tag == "MOUSE_DOWN"
        );
        assert_matches!(
            Action::from_json(&json!({"x": 0.5})),
            Err(ActionError::MalformedAction { .. })
        );
    }

    #[test]
    fn test_tags_match_serialization() {
        let actions = [
            Action::RedoHistory,
            Action::ChangeImage { delta: 1 },
            Action::ImageOrVideoLoaded {
                metadata: LoadedMetadata {
                    natural_width: 640.0,
                    natural_height: 480.0,
                    duration: None,
                },
            },
        ];
        for action in actions {
            let json = serde_json::to_value(&action).expect("serialize");
            assert_eq!(json["type"], action.tag());
            assert!(Action::TAGS.contains(&action.tag()));
        }
    }

    #[test]
    fn test_header_button_names() {
        assert_eq!(HeaderButton::from_name("Next"), Some(HeaderButton::Next));
        assert_eq!(HeaderButton::from_name("fullscreen"), Some(HeaderButton::Fullscreen));
        assert_eq!(HeaderButton::from_name("Exit"), None);
    }
}
