//! Image (or video frame) with its regions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::region::{Region, RegionId, validate_region_set};
use crate::error::RegionError;

/// Physical size of the image, used by renderers for distance read-outs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealSize {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit_name: String,
}

/// An image in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_size: Option<RealSize>,
    /// Position on a video timeline when the image is a frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_time: Option<f64>,
    /// Image-level class label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls: Option<String>,
    /// Image-level tags.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl Image {
    /// Create an image without regions.
    pub fn new(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            name: name.into(),
            regions: Vec::new(),
            real_size: None,
            frame_time: None,
            cls: None,
            tags: BTreeSet::new(),
        }
    }

    /// Builder: set the regions.
    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    /// Get a region by id.
    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    /// Get a mutable region by id.
    pub fn region_mut(&mut self, id: &RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| &r.id == id)
    }

    /// Largest numeric region id, if any.
    pub fn max_numeric_id(&self) -> Option<u64> {
        self.regions
            .iter()
            .filter_map(|r| match r.id {
                RegionId::Number(n) => Some(n),
                RegionId::Text(_) => None,
            })
            .max()
    }

    /// Validate every region and the uniqueness of their ids.
    pub fn validate(&self) -> Result<(), RegionError> {
        validate_region_set(&self.regions)
    }
}
