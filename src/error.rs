//! Error types for region ingestion and action handling.
//!
//! None of these ever escape the reducer as a panic: a rejected action leaves
//! the state unchanged and the error is recorded on the returned state for the
//! host to inspect.

use serde::Serialize;
use thiserror::Error;

use crate::model::RegionId;

/// Reasons a region is rejected at ingestion.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum RegionError {
    /// JSON did not match any region shape
    #[error("Malformed region: {message}")]
    Malformed {
        /// Description of the parse failure
        message: String,
    },

    /// A coordinate lies outside the normalized `[0, 1]` range
    #[error("Coordinate '{field}' out of range: {value}")]
    CoordinateOutOfRange {
        /// Name of the offending field
        field: String,
        /// The rejected value
        value: f64,
    },

    /// A coordinate is NaN or infinite
    #[error("Coordinate '{field}' is not a finite number")]
    NonFinite {
        /// Name of the offending field
        field: String,
    },

    /// Box with a non-positive extent
    #[error("Degenerate box: w={w}, h={h}")]
    DegenerateBox {
        /// Width of the box
        w: f64,
        /// Height of the box
        h: f64,
    },

    /// Closed polygon with fewer than three vertices
    #[error("Closed polygon needs at least 3 points, found {count}")]
    TooFewPolygonPoints {
        /// Number of vertices found
        count: usize,
    },

    /// Expanding line without any point
    #[error("Expanding line has no points")]
    EmptyExpandingLine,

    /// Two regions of one image share an id
    #[error("Duplicate region id {0}")]
    DuplicateId(RegionId),

    /// Keyframe time is negative, NaN or infinite
    #[error("Keyframe of region {id} has invalid time {time}")]
    InvalidKeyframeTime {
        /// The region the track belongs to
        id: RegionId,
        /// The rejected time
        time: f64,
    },

    /// Keyframe shape differs in kind from its region
    #[error("Keyframe of region {id} is a {found}, expected a {expected}")]
    KeyframeKindMismatch {
        /// The region the track belongs to
        id: RegionId,
        /// Kind of the region
        expected: String,
        /// Kind of the keyframe shape
        found: String,
    },

    /// Numeric id above the range new ids are allocated from
    #[error("Region id {0} is reserved")]
    ReservedId(u64),
}

impl RegionError {
    /// Create a malformed region error with a message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Reasons an action is rejected by the reducer.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum ActionError {
    /// Action tag is not recognized
    #[error("Unknown action type '{0}'")]
    UnknownAction(String),

    /// Action tag is known but its fields are missing or mistyped
    #[error("Malformed {tag} action: {message}")]
    MalformedAction {
        /// The action tag
        tag: String,
        /// Description of the parse failure
        message: String,
    },

    /// Referenced region does not exist in the active image
    #[error("Region {0} not found")]
    RegionNotFound(RegionId),

    /// Referenced region has a different shape than the action needs
    #[error("Region {id} is a {found}, expected a {expected}")]
    WrongRegionKind {
        /// The region id
        id: RegionId,
        /// Kind the action operates on
        expected: String,
        /// Kind actually found
        found: String,
    },

    /// Polygon vertex index outside the vertex list
    #[error("Point index {index} out of range for region {id} ({len} points)")]
    PointIndexOutOfRange {
        /// The region id
        id: RegionId,
        /// The rejected index
        index: usize,
        /// Number of vertices in the region
        len: usize,
    },

    /// Keypoint name not present on the region
    #[error("Keypoint '{keypoint}' not found on region {id}")]
    KeypointNotFound {
        /// The region id
        id: RegionId,
        /// The missing keypoint name
        keypoint: String,
    },

    /// Geometry edits are not allowed on locked regions
    #[error("Region {0} is locked")]
    RegionLocked(RegionId),

    /// A region carried by the action failed validation
    #[error("Invalid region: {0}")]
    InvalidRegion(#[from] RegionError),

    /// Mutating action while the editor is read-only
    #[error("Editor is read-only, rejected {0}")]
    ReadOnly(String),

    /// Tool is not in the enabled tool set
    #[error("Tool '{0}' is not enabled")]
    ToolDisabled(String),

    /// `RESTORE_HISTORY` index outside the history
    #[error("No history entry at index {0}")]
    NoHistoryEntry(usize),

    /// `REDO_HISTORY` with an empty redo stack
    #[error("Nothing to redo")]
    NothingToRedo,

    /// The session has no images
    #[error("No active image")]
    NoActiveImage,

    /// Keyframe deletion at a time that has no keyframe
    #[error("No keyframe at time {time}")]
    KeyframeNotFound {
        /// The requested time
        time: f64,
    },

    /// Video-only action in an image session
    #[error("Action requires a video session")]
    NotAVideo,

    /// Time value is NaN or infinite
    #[error("Invalid time value {0}")]
    InvalidTime(f64),

    /// Region creation outside the allowed area
    #[error("Position ({x:.3}, {y:.3}) is outside the allowed area")]
    OutsideAllowedArea {
        /// Cursor x
        x: f64,
        /// Cursor y
        y: f64,
    },

    /// `create-keypoints` without any keypoint definition configured
    #[error("No keypoint definition configured")]
    NoKeypointDefinition,

    /// Region is not visible at the current video time
    #[error("Region {0} is not present at the current video time")]
    RegionAbsentAtTime(RegionId),

    /// Every numeric region id is taken
    #[error("No region ids left to allocate")]
    RegionIdsExhausted,
}

impl ActionError {
    /// Create a wrong-kind error.
    pub fn wrong_kind(id: RegionId, expected: &str, found: &str) -> Self {
        Self::WrongRegionKind {
            id,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
