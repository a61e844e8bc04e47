//! Canvas pan/zoom state.
//!
//! The viewport maps normalized image coordinates to normalized view
//! coordinates: `view = (image - pan) * zoom`. `pan` is the image point shown
//! at the view's top-left corner. Pointer positions in actions are always image
//! coordinates; during a pan gesture they are mapped with the viewport as it
//! was when the gesture started.

use serde::{Deserialize, Serialize};

use crate::constants::{ZOOM_MAX, ZOOM_MIN};
use crate::model::{BoxGeometry, Point};

/// Represents pan/zoom transform state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Point,
}

impl Viewport {
    /// Create a new viewport with the given zoom and pan.
    pub fn new(zoom: f64, pan: Point) -> Self {
        Self { zoom, pan }
    }

    /// Create an identity viewport (zoom=1, no pan).
    pub fn identity() -> Self {
        Self::new(1.0, Point::default())
    }

    /// Map an image point into view space.
    pub fn image_to_view(&self, p: Point) -> Point {
        Point::new((p.x - self.pan.x) * self.zoom, (p.y - self.pan.y) * self.zoom)
    }

    /// Zoom while keeping the image point under the cursor fixed on screen.
    ///
    /// The new zoom is clamped to the allowed range.
    pub fn zoom_to_cursor(&self, new_zoom: f64, cursor: Point) -> Viewport {
        let new_zoom = new_zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        // Where the cursor sits in the view before zooming
        let view_pos = self.image_to_view(cursor);
        Viewport {
            zoom: new_zoom,
            pan: Point::new(
                cursor.x - view_pos.x / new_zoom,
                cursor.y - view_pos.y / new_zoom,
            ),
        }
    }

    /// Apply a pan delta in image units.
    pub fn pan_by(&self, dx: f64, dy: f64) -> Viewport {
        Viewport {
            zoom: self.zoom,
            pan: Point::new(self.pan.x + dx, self.pan.y + dy),
        }
    }

    /// Viewport showing exactly the given image box (the larger side fills the view).
    pub fn fit_box(b: &BoxGeometry) -> Viewport {
        let extent = b.w.max(b.h);
        if extent <= 0.0 {
            return Viewport::identity();
        }
        Viewport {
            zoom: (1.0 / extent).clamp(ZOOM_MIN, ZOOM_MAX),
            pan: Point::new(b.x, b.y),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}
