//! Editor tools.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tools available in the editor toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// Select and move existing regions
    #[default]
    Select,
    /// Drag the canvas
    Pan,
    /// Zoom in/out
    Zoom,
    CreateBox,
    CreatePoint,
    CreatePolygon,
    CreateExpandingLine,
    CreateKeypoints,
    /// Draw the box that constrains where regions may be created
    ModifyAllowedArea,
    /// Toggle tag labels (does not replace the active tool)
    ShowTags,
    /// Toggle the segmentation mask (does not replace the active tool)
    ShowMask,
    #[serde(alias = "Fullscreen")]
    Fullscreen,
    #[serde(alias = "Window")]
    Window,
}

impl Tool {
    /// Get the tool name as used in actions.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Pan => "pan",
            Tool::Zoom => "zoom",
            Tool::CreateBox => "create-box",
            Tool::CreatePoint => "create-point",
            Tool::CreatePolygon => "create-polygon",
            Tool::CreateExpandingLine => "create-expanding-line",
            Tool::CreateKeypoints => "create-keypoints",
            Tool::ModifyAllowedArea => "modify-allowed-area",
            Tool::ShowTags => "show-tags",
            Tool::ShowMask => "show-mask",
            Tool::Fullscreen => "fullscreen",
            Tool::Window => "window",
        }
    }

    /// Get all tools.
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Select,
            Tool::Pan,
            Tool::Zoom,
            Tool::CreateBox,
            Tool::CreatePoint,
            Tool::CreatePolygon,
            Tool::CreateExpandingLine,
            Tool::CreateKeypoints,
            Tool::ModifyAllowedArea,
            Tool::ShowTags,
            Tool::ShowMask,
            Tool::Fullscreen,
            Tool::Window,
        ]
    }

    /// Check if this tool creates regions.
    pub fn is_create_tool(&self) -> bool {
        matches!(
            self,
            Tool::CreateBox
                | Tool::CreatePoint
                | Tool::CreatePolygon
                | Tool::CreateExpandingLine
                | Tool::CreateKeypoints
        )
    }

    /// Tools that stay available regardless of the enabled tool set.
    pub fn always_enabled(&self) -> bool {
        matches!(self, Tool::Select | Tool::Pan | Tool::Fullscreen | Tool::Window)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
