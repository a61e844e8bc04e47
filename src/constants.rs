//! Global constants for the annotation engine.
//!
//! All coordinates are normalized to the image extent, so every distance
//! threshold below is a fraction of the image width/height.

/// Default maximum number of undo snapshots kept in history.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default minimum width/height of a box during resize.
pub const DEFAULT_MIN_BOX_SIZE: f64 = 0.001;

/// Default snap distance for closing a polygon by clicking near its first vertex.
pub const DEFAULT_POLYGON_CLOSE_THRESHOLD: f64 = 0.01;

/// Default minimum drag for a newly drawn box to be kept on mouse up.
pub const DEFAULT_NEW_BOX_MIN_DRAG: f64 = 0.002;

/// Clicking this close to the last point of an expanding line finishes it.
pub const EXPANDING_LINE_FINISH_THRESHOLD: f64 = 0.005;

/// A zoom drag shorter than this is treated as a click (zoom in by a factor).
pub const ZOOM_CLICK_THRESHOLD: f64 = 0.01;

/// Zoom factor applied per zoom-tool click.
pub const ZOOM_FACTOR: f64 = 1.5;

/// Minimum canvas zoom level.
pub const ZOOM_MIN: f64 = 0.1;

/// Maximum canvas zoom level.
pub const ZOOM_MAX: f64 = 20.0;

/// Saturation used for generated region colors.
pub const REGION_COLOR_SATURATION: f32 = 0.7;

/// Value/brightness used for generated region colors.
pub const REGION_COLOR_VALUE: f32 = 0.9;
