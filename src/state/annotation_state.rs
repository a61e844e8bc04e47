//! The root annotation state and the session it is created from.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Mode;
use crate::color_utils::region_color;
use crate::config::EditorConfig;
use crate::error::{ActionError, RegionError};
use crate::history::History;
use crate::keyframes::{KeyframeMap, implied_regions};
use crate::model::{BoxGeometry, Image, Point, Region, RegionId, Tool};
use crate::view::Viewport;

/// Whether the session annotates still images or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    #[default]
    Image,
    Video,
}

/// Video playback sub-state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoState {
    pub current_time: f64,
    pub duration: f64,
    pub playing: bool,
    pub keyframes: Arc<KeyframeMap>,
}

/// What a host loads an editor from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub images: Vec<Image>,
    #[serde(default)]
    pub annotation_type: AnnotationType,
    #[serde(default)]
    pub video_duration: f64,
    #[serde(default)]
    pub selected_image_index: usize,
    #[serde(default)]
    pub selected_tool: Tool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_area: Option<BoxGeometry>,
    #[serde(default, skip_serializing_if = "KeyframeMap::is_empty")]
    pub keyframes: KeyframeMap,
    /// Inline configuration, used when the host has none of its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EditorConfig>,
}

impl Session {
    /// An image session.
    pub fn new(images: Vec<Image>) -> Self {
        Self {
            images,
            annotation_type: AnnotationType::Image,
            video_duration: 0.0,
            selected_image_index: 0,
            selected_tool: Tool::Select,
            allowed_area: None,
            keyframes: KeyframeMap::new(),
            config: None,
        }
    }

    /// Builder: make this a video session of the given duration.
    pub fn video(mut self, duration: f64) -> Self {
        self.annotation_type = AnnotationType::Video;
        self.video_duration = duration;
        self
    }

    /// Parse a session from JSON.
    pub fn from_json(json: &str) -> Result<Self, RegionError> {
        serde_json::from_str(json).map_err(|e| RegionError::malformed(e.to_string()))
    }
}

/// The complete editor state.
///
/// Replaced wholesale on every dispatch. Images and the keyframe map sit
/// behind `Arc`, so untouched images are shared between states and history
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationState {
    pub images: Vec<Arc<Image>>,
    pub selected_image_index: usize,
    pub annotation_type: AnnotationType,
    pub selected_tool: Tool,
    pub selected_region_id: Option<RegionId>,
    pub mode: Mode,
    pub allowed_area: Option<BoxGeometry>,
    pub show_tags: bool,
    pub show_mask: bool,
    pub full_screen: bool,
    pub settings_open: bool,
    pub view: Viewport,
    pub video: VideoState,
    #[serde(skip)]
    pub history: History<Arc<AnnotationState>>,
    /// Tag of the most recent action
    pub last_action: Option<String>,
    /// Error recorded by the most recent action
    pub error: Option<ActionError>,
    pub config: Arc<EditorConfig>,
    /// Id given to the next created region
    pub next_region_id: u64,
}

impl AnnotationState {
    /// Create the state for a session, validating every image.
    ///
    /// In a video session, regions without keyframes get one at time 0 so
    /// they appear on the timeline.
    pub fn from_session(session: Session, config: EditorConfig) -> Result<Self, RegionError> {
        let config = config.sanitized();
        for image in &session.images {
            image.validate()?;
        }
        if let Some(area) = &session.allowed_area {
            crate::model::Shape::Box(*area).validate()?;
        }

        let next_region_id = session
            .images
            .iter()
            .filter_map(Image::max_numeric_id)
            .max()
            .map_or(1, |max| max.saturating_add(1));

        let regions: Vec<&Region> = session
            .images
            .iter()
            .flat_map(|image| &image.regions)
            .collect();
        session.keyframes.validate(&regions)?;

        let mut keyframes = session.keyframes;
        let duration = if session.video_duration.is_finite() {
            session.video_duration.max(0.0)
        } else {
            0.0
        };
        if session.annotation_type == AnnotationType::Video {
            for region in session.images.iter().flat_map(|image| &image.regions) {
                if keyframes.track(&region.id).is_none() {
                    keyframes.set_keyframe(&region.id, 0.0, region.shape.clone());
                }
            }
        }

        let selected_image_index = session
            .selected_image_index
            .min(session.images.len().saturating_sub(1));
        let selected_tool = if config.is_tool_enabled(session.selected_tool) {
            session.selected_tool
        } else {
            Tool::Select
        };

        log::info!(
            "📂 Session loaded: {} images, {:?} mode",
            session.images.len(),
            session.annotation_type
        );

        Ok(Self {
            images: session.images.into_iter().map(Arc::new).collect(),
            selected_image_index,
            annotation_type: session.annotation_type,
            selected_tool,
            selected_region_id: None,
            mode: Mode::Idle,
            allowed_area: session.allowed_area,
            show_tags: true,
            show_mask: false,
            full_screen: false,
            settings_open: false,
            view: Viewport::identity(),
            video: VideoState {
                current_time: 0.0,
                duration,
                playing: false,
                keyframes: Arc::new(keyframes),
            },
            history: History::new(config.history_limit),
            last_action: None,
            error: None,
            config: Arc::new(config),
            next_region_id,
        })
    }

    pub fn is_video(&self) -> bool {
        self.annotation_type == AnnotationType::Video
    }

    /// The image being annotated.
    pub fn active_image(&self) -> Option<&Image> {
        self.images.get(self.selected_image_index).map(Arc::as_ref)
    }

    /// Mutable access to the active image (copied first if shared).
    pub fn active_image_mut(&mut self) -> Option<&mut Image> {
        self.images
            .get_mut(self.selected_image_index)
            .map(Arc::make_mut)
    }

    /// A region of the active image.
    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.active_image()?.region(id)
    }

    /// The selected region, if any.
    pub fn selected_region(&self) -> Option<&Region> {
        self.region(self.selected_region_id.as_ref()?)
    }

    /// Regions present on screen right now.
    ///
    /// For video this is derived from the keyframes at the current time.
    pub fn visible_regions(&self) -> Vec<Region> {
        let Some(image) = self.active_image() else {
            return Vec::new();
        };
        if self.is_video() {
            implied_regions(&image.regions, &self.video.keyframes, self.video.current_time)
        } else {
            image.regions.clone()
        }
    }

    /// Topmost visible region under a point.
    pub fn region_at(&self, point: &Point) -> Option<Region> {
        self.visible_regions()
            .into_iter()
            .rev()
            .find(|region| region.visible && region.shape.contains_point(point))
    }

    /// Take the next region id and its color.
    ///
    /// `u64::MAX` is never handed out, so ingested ids stay below it.
    pub fn allocate_region_id(&mut self) -> Result<(RegionId, String), ActionError> {
        let n = self.next_region_id;
        self.next_region_id = n.checked_add(1).ok_or(ActionError::RegionIdsExhausted)?;
        Ok((RegionId::Number(n), region_color(n)))
    }

    /// Copy of this state without its history.
    pub fn snapshot(&self) -> Arc<AnnotationState> {
        Arc::new(AnnotationState {
            images: self.images.clone(),
            selected_image_index: self.selected_image_index,
            annotation_type: self.annotation_type,
            selected_tool: self.selected_tool,
            selected_region_id: self.selected_region_id.clone(),
            mode: self.mode.clone(),
            allowed_area: self.allowed_area,
            show_tags: self.show_tags,
            show_mask: self.show_mask,
            full_screen: self.full_screen,
            settings_open: self.settings_open,
            view: self.view,
            video: self.video.clone(),
            history: History::new(0),
            last_action: self.last_action.clone(),
            error: self.error.clone(),
            config: Arc::clone(&self.config),
            next_region_id: self.next_region_id,
        })
    }

    /// Serialize the state (without history) as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
