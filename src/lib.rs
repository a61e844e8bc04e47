//! Region Annotator - annotation state engine
//!
//! The headless core of an image and video region annotator: a pure reducer
//! over editor actions, with box/polygon/point/keypoint/line geometry, video
//! keyframe interpolation, and snapshot undo history. Rendering, asset
//! decoding and export live in the host.

pub mod action;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod hooks;
pub mod keyframes;
pub mod model;
pub mod reducer;
pub mod state;
pub mod view;

pub use action::{Action, HeaderButton, LoadedMetadata};
pub use config::{ConfigError, EditorConfig, KeypointDefinition, Landmark};
pub use editor::Editor;
pub use error::{ActionError, RegionError};
pub use hooks::HostHooks;
pub use model::{Image, Point, Region, RegionId, Shape, Tool};
pub use reducer::{reduce, reduce_json};
pub use state::{AnnotationState, Session};
