//! Video keyframes and interpolation.
//!
//! Each region of a video session owns a track of `(time, shape)` pairs kept
//! strictly increasing by time. The geometry shown at an arbitrary time (the
//! implied geometry) is derived on read: exact keyframes are returned as-is,
//! times between two keyframes are linearly interpolated, and times outside
//! the track's range have no geometry at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RegionError;
use crate::model::{
    BoxGeometry, ExpandingLineGeometry, KeypointsGeometry, Point, PolygonGeometry, Region,
    RegionId, Shape,
};

/// Explicitly authored geometry at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub shape: Shape,
}

/// The keyframes of one region, ordered by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeTrack {
    pub region_id: RegionId,
    keyframes: Vec<Keyframe>,
}

impl KeyframeTrack {
    /// Create an empty track.
    pub fn new(region_id: RegionId) -> Self {
        Self {
            region_id,
            keyframes: Vec::new(),
        }
    }

    fn search(&self, time: f64) -> Result<usize, usize> {
        self.keyframes.binary_search_by(|k| k.time.total_cmp(&time))
    }

    /// Insert a keyframe, replacing one at the same time.
    pub fn insert(&mut self, time: f64, shape: Shape) {
        match self.search(time) {
            Ok(i) => self.keyframes[i].shape = shape,
            Err(i) => self.keyframes.insert(i, Keyframe { time, shape }),
        }
    }

    /// Remove the keyframe at exactly `time`.
    pub fn remove(&mut self, time: f64) -> Option<Shape> {
        let i = self.search(time).ok()?;
        Some(self.keyframes.remove(i).shape)
    }

    /// First and last keyframe time.
    pub fn range(&self) -> Option<(f64, f64)> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        Some((first.time, last.time))
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyframe> {
        self.keyframes.iter()
    }

    /// Geometry at time `t`, or `None` outside the keyframed range.
    pub fn implied_shape(&self, t: f64) -> Option<Shape> {
        match self.search(t) {
            Ok(i) => Some(self.keyframes[i].shape.clone()),
            // Before the first or after the last keyframe
            Err(0) => None,
            Err(i) if i == self.keyframes.len() => None,
            Err(i) => {
                let k0 = &self.keyframes[i - 1];
                let k1 = &self.keyframes[i];
                let alpha = (t - k0.time) / (k1.time - k0.time);
                Some(interpolate_shape(&k0.shape, &k1.shape, alpha))
            }
        }
    }
}

/// Keyframe tracks of all regions, by region id.
///
/// Serialized as a list of tracks since region ids can be strings or numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<KeyframeTrack>", into = "Vec<KeyframeTrack>")]
pub struct KeyframeMap {
    tracks: BTreeMap<RegionId, KeyframeTrack>,
}

impl From<Vec<KeyframeTrack>> for KeyframeMap {
    fn from(tracks: Vec<KeyframeTrack>) -> Self {
        let mut map = KeyframeMap::default();
        for track in tracks {
            for keyframe in track.keyframes {
                map.set_keyframe(&track.region_id, keyframe.time, keyframe.shape);
            }
        }
        map
    }
}

impl From<KeyframeMap> for Vec<KeyframeTrack> {
    fn from(map: KeyframeMap) -> Self {
        map.tracks.into_values().collect()
    }
}

impl KeyframeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track of a region, if it has any keyframe.
    pub fn track(&self, id: &RegionId) -> Option<&KeyframeTrack> {
        self.tracks.get(id)
    }

    /// Write (or overwrite) the keyframe of a region at `time`.
    pub fn set_keyframe(&mut self, id: &RegionId, time: f64, shape: Shape) {
        self.tracks
            .entry(id.clone())
            .or_insert_with(|| KeyframeTrack::new(id.clone()))
            .insert(time, shape);
    }

    /// Drop every keyframe of a region.
    pub fn remove_track(&mut self, id: &RegionId) -> Option<KeyframeTrack> {
        self.tracks.remove(id)
    }

    /// Remove the keyframes at `time`, for one region or for all of them.
    ///
    /// Tracks left empty are dropped. Returns how many keyframes were removed.
    pub fn remove_keyframes_at(&mut self, time: f64, id: Option<&RegionId>) -> usize {
        let mut removed = 0;
        for (region_id, track) in self.tracks.iter_mut() {
            if id.is_some_and(|id| id != region_id) {
                continue;
            }
            if track.remove(time).is_some() {
                removed += 1;
            }
        }
        self.tracks.retain(|_, track| !track.is_empty());
        removed
    }

    /// Keep only the tracks of the given regions.
    pub fn retain_regions(&mut self, regions: &[Region]) {
        self.tracks
            .retain(|id, _| regions.iter().any(|region| &region.id == id));
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &KeyframeTrack> {
        self.tracks.values()
    }

    /// Geometry of a region at time `t`.
    pub fn implied_shape(&self, id: &RegionId, t: f64) -> Option<Shape> {
        self.tracks.get(id)?.implied_shape(t)
    }

    /// Check loaded keyframes against the regions they animate.
    ///
    /// Times must be finite and non-negative, every shape must be valid, and
    /// a track must keep the shape kind of its region.
    pub fn validate(&self, regions: &[&Region]) -> Result<(), RegionError> {
        for track in self.tracks.values() {
            let template = regions.iter().find(|r| r.id == track.region_id);
            for keyframe in &track.keyframes {
                if !keyframe.time.is_finite() || keyframe.time < 0.0 {
                    return Err(RegionError::InvalidKeyframeTime {
                        id: track.region_id.clone(),
                        time: keyframe.time,
                    });
                }
                keyframe.shape.validate()?;
                if let Some(region) = template.filter(|r| r.kind() != keyframe.shape.kind()) {
                    return Err(RegionError::KeyframeKindMismatch {
                        id: track.region_id.clone(),
                        expected: region.kind().to_string(),
                        found: keyframe.shape.kind().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn lerp(a: f64, b: f64, alpha: f64) -> f64 {
    a + (b - a) * alpha
}

/// Linear interpolation between two shapes, field by field.
///
/// Shapes that are not structurally compatible (different variants, or
/// different vertex counts) hold the earlier shape. Keypoints interpolate per
/// name when both sides have the keypoint, otherwise they keep the earlier one.
pub fn interpolate_shape(g0: &Shape, g1: &Shape, alpha: f64) -> Shape {
    match (g0, g1) {
        (Shape::Box(a), Shape::Box(b)) => Shape::Box(BoxGeometry::new(
            lerp(a.x, b.x, alpha),
            lerp(a.y, b.y, alpha),
            lerp(a.w, b.w, alpha),
            lerp(a.h, b.h, alpha),
        )),
        (Shape::Point(a), Shape::Point(b)) => Shape::Point(a.lerp(b, alpha)),
        (Shape::Polygon(a), Shape::Polygon(b)) if a.points.len() == b.points.len() => {
            Shape::Polygon(PolygonGeometry {
                points: lerp_points(&a.points, &b.points, alpha),
                open: a.open,
            })
        }
        (Shape::ExpandingLine(a), Shape::ExpandingLine(b)) if a.points.len() == b.points.len() => {
            Shape::ExpandingLine(ExpandingLineGeometry {
                points: lerp_points(&a.points, &b.points, alpha),
                unfinished: a.unfinished,
                candidate_point: None,
            })
        }
        (Shape::Keypoints(a), Shape::Keypoints(b)) => Shape::Keypoints(KeypointsGeometry {
            keypoints_definition_id: a.keypoints_definition_id.clone(),
            points: a
                .points
                .iter()
                .map(|(name, p0)| {
                    let p = match (p0, b.points.get(name)) {
                        (Some(p0), Some(Some(p1))) => Some(p0.lerp(p1, alpha)),
                        _ => *p0,
                    };
                    (name.clone(), p)
                })
                .collect(),
        }),
        _ => g0.clone(),
    }
}

fn lerp_points(a: &[Point], b: &[Point], alpha: f64) -> Vec<Point> {
    a.iter().zip(b).map(|(p0, p1)| p0.lerp(p1, alpha)).collect()
}

/// Regions as they appear at time `t`.
///
/// Only regions with a keyframe range covering `t` are returned. Non-geometric
/// fields come from the region template.
pub fn implied_regions(regions: &[Region], keyframes: &KeyframeMap, t: f64) -> Vec<Region> {
    regions
        .iter()
        .filter_map(|region| {
            let shape = keyframes.implied_shape(&region.id, t)?;
            Some(Region {
                shape,
                ..region.clone()
            })
        })
        .collect()
}
