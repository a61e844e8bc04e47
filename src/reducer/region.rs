//! Region edits and selection.

use std::sync::Arc;

use crate::error::ActionError;
use crate::geometry::insert_polygon_point;
use crate::hooks::HostHooks;
use crate::model::{Point, Region, RegionId, Shape, validate_region_set};
use crate::state::{AnnotationState, Mode};

use super::{
    current_shape, editable_shape, find_region, push_history, remove_region, set_selection,
    write_shape,
};

/// Handle `SELECT_REGION`.
pub fn handle_select_region(
    state: &mut AnnotationState,
    region_id: Option<RegionId>,
    hooks: &HostHooks,
) -> Result<(), ActionError> {
    let Some(id) = region_id else {
        set_selection(state, None);
        return Ok(());
    };
    let region = find_region(state, &id)?.clone();
    set_selection(state, Some(&id));
    log::debug!("👆 Selected region {}", id);
    hooks.custom_select_region.call(region);
    Ok(())
}

/// Handle `CHANGE_REGION`: replace geometry and attributes of one region atomically.
pub fn handle_change_region(state: &mut AnnotationState, region: Region) -> Result<(), ActionError> {
    region.validate()?;
    let existing = find_region(state, &region.id)?.clone();
    if !existing.shape.same_kind(&region.shape) {
        return Err(ActionError::wrong_kind(
            region.id.clone(),
            existing.kind(),
            region.kind(),
        ));
    }

    // A video region may be off screen at the current time; its template still applies
    let current = current_shape(state, &existing).unwrap_or_else(|_| existing.shape.clone());
    let geometry_changed = region.shape != current;
    if existing.locked && region.locked && geometry_changed {
        return Err(ActionError::RegionLocked(region.id));
    }

    push_history(state, "Change Region");

    let mut updated = existing;
    updated.color = region.color;
    if !state.config.disable_classes {
        updated.cls = region.cls;
    }
    if !state.config.disable_tags {
        updated.tags = region.tags;
    }
    updated.locked = region.locked;
    updated.visible = region.visible;
    updated.shape = region.shape.clone();

    let id = updated.id.clone();
    let image = state.active_image_mut().ok_or(ActionError::NoActiveImage)?;
    if let Some(slot) = image.region_mut(&id) {
        *slot = updated;
    }
    if geometry_changed {
        write_shape(state, &id, region.shape)?;
    }
    log::debug!("✏️  Changed region {}", id);
    Ok(())
}

/// Handle `UPDATE_REGIONS`: authoritative replace of the active image's regions.
pub fn handle_update_regions(
    state: &mut AnnotationState,
    regions: Vec<Region>,
) -> Result<(), ActionError> {
    validate_region_set(&regions)?;
    if state.active_image().is_none() {
        return Err(ActionError::NoActiveImage);
    }

    push_history(state, "Update Regions");

    if state.is_video() {
        let time = state.video.current_time;
        let keyframes = Arc::make_mut(&mut state.video.keyframes);
        keyframes.retain_regions(&regions);
        for region in &regions {
            if keyframes.implied_shape(&region.id, time).as_ref() != Some(&region.shape) {
                keyframes.set_keyframe(&region.id, time, region.shape.clone());
            }
        }
    }

    let max_id = regions
        .iter()
        .filter_map(|r| match r.id {
            RegionId::Number(n) => Some(n),
            RegionId::Text(_) => None,
        })
        .max();
    if let Some(max_id) = max_id {
        state.next_region_id = state.next_region_id.max(max_id.saturating_add(1));
    }

    let still_selected = state
        .selected_region_id
        .clone()
        .filter(|id| regions.iter().any(|r| &r.id == id));
    if state
        .mode
        .region_id()
        .is_some_and(|id| !regions.iter().any(|r| &r.id == id))
    {
        state.mode = Mode::Idle;
    }

    let count = regions.len();
    if let Some(image) = state.active_image_mut() {
        image.regions = regions;
    }
    set_selection(state, still_selected.as_ref());
    log::info!("📝 Replaced regions ({} total)", count);
    Ok(())
}

/// Handle `DELETE_REGION`.
pub fn handle_delete_region(
    state: &mut AnnotationState,
    region_id: RegionId,
    hooks: &HostHooks,
) -> Result<(), ActionError> {
    let region = find_region(state, &region_id)?.clone();
    push_history(state, "Delete Region");
    remove_region(state, &region_id);
    log::info!("🗑️ Deleted region {}", region_id);
    hooks.custom_delete_region.call(region);
    Ok(())
}

/// Handle `OPEN_REGION_EDITOR`: focus the editor on one region.
pub fn handle_open_region_editor(
    state: &mut AnnotationState,
    region_id: RegionId,
    hooks: &HostHooks,
) -> Result<(), ActionError> {
    find_region(state, &region_id)?;
    if let Some(image) = state.active_image_mut() {
        for region in &mut image.regions {
            region.editing_labels = region.id == region_id;
        }
    }
    set_selection(state, Some(&region_id));
    hooks.custom_open_region.call(region_id);
    Ok(())
}

/// Handle `CLOSE_REGION_EDITOR`.
pub fn handle_close_region_editor(
    state: &mut AnnotationState,
    region_id: RegionId,
) -> Result<(), ActionError> {
    if !find_region(state, &region_id)?.editing_labels {
        return Ok(());
    }
    if let Some(region) = state
        .active_image_mut()
        .and_then(|image| image.region_mut(&region_id))
    {
        region.editing_labels = false;
    }
    Ok(())
}

/// Handle `LINK_RESOURCE`: only notifies the host.
pub fn handle_link_resource(
    state: &mut AnnotationState,
    region_id: RegionId,
    hooks: &HostHooks,
) -> Result<(), ActionError> {
    find_region(state, &region_id)?;
    hooks.on_link_resource.call(region_id);
    Ok(())
}

/// Handle `ADD_POLYGON_POINT`.
pub fn handle_add_polygon_point(
    state: &mut AnnotationState,
    region_id: RegionId,
    point: Point,
    point_index: Option<usize>,
) -> Result<(), ActionError> {
    let shape = editable_shape(state, &region_id)?;
    let Shape::Polygon(polygon) = &shape else {
        return Err(ActionError::wrong_kind(region_id, "polygon", shape.kind()));
    };
    let len = polygon.points.len();
    let inserted = insert_polygon_point(polygon, point, point_index).ok_or_else(|| {
        ActionError::PointIndexOutOfRange {
            id: region_id.clone(),
            index: point_index.unwrap_or(len),
            len,
        }
    })?;

    push_history(state, "Add Polygon Point");
    log::debug!("➕ Added point to polygon {} ({} points)", region_id, len + 1);
    write_shape(state, &region_id, Shape::Polygon(inserted))
}

/// Handle `DELETE_KEYFRAME`: remove the keyframe at `time` for one or all regions.
pub fn handle_delete_keyframe(
    state: &mut AnnotationState,
    time: f64,
    region_id: Option<RegionId>,
) -> Result<(), ActionError> {
    if !state.is_video() {
        return Err(ActionError::NotAVideo);
    }
    if !time.is_finite() {
        return Err(ActionError::InvalidTime(time));
    }
    if let Some(id) = &region_id {
        find_region(state, id)?;
    }

    let mut keyframes = state.video.keyframes.as_ref().clone();
    let removed = keyframes.remove_keyframes_at(time, region_id.as_ref());
    if removed == 0 {
        return Err(ActionError::KeyframeNotFound { time });
    }

    push_history(state, "Delete Keyframe");
    state.video.keyframes = Arc::new(keyframes);
    log::info!("🗑️ Deleted {} keyframe(s) at {:.3}s", removed, time);
    Ok(())
}

/// Header `Clone`: copy the active image's regions onto the next image.
///
/// Only applies when the next image has no regions yet. Video sessions key
/// keyframes by region id, so they are left alone.
pub fn clone_regions_to_next_image(state: &mut AnnotationState) -> Result<(), ActionError> {
    let Some(image) = state.active_image() else {
        return Err(ActionError::NoActiveImage);
    };
    let next_index = state.selected_image_index + 1;
    let target_is_empty = state
        .images
        .get(next_index)
        .is_some_and(|next| next.regions.is_empty());
    if state.is_video() || image.regions.is_empty() || !target_is_empty {
        log::debug!("Nothing to clone onto image {}", next_index + 1);
        return Ok(());
    }

    let regions: Vec<Region> = image
        .regions
        .iter()
        .cloned()
        .map(|mut region| {
            region.highlighted = false;
            region.editing_labels = false;
            region
        })
        .collect();
    push_history(state, "Clone Regions");
    let count = regions.len();
    if let Some(next) = state.images.get_mut(next_index) {
        Arc::make_mut(next).regions = regions;
    }
    log::info!("📋 Cloned {} regions onto image {}", count, next_index + 1);
    Ok(())
}
