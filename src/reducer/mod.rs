//! The action reducer.
//!
//! [`reduce`] is the single entry point: it takes the current state and one
//! action and returns the next state. It never panics and never leaves a
//! half-applied action behind: a rejected action returns the previous state
//! with only `last_action` and `error` updated.
//!
//! Handlers are split by concern:
//! - `mouse`: pointer gestures (creation, transforms, pan, zoom, cancel)
//! - `region`: region-level edits and selection
//! - `navigation`: tools, images, video playback, header buttons, history

mod mouse;
mod navigation;
mod region;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde_json::Value;

use crate::action::Action;
use crate::error::ActionError;
use crate::hooks::HostHooks;
use crate::model::{Point, Region, RegionId, Shape};
use crate::state::{AnnotationState, Checkpoint, Mode};

/// Apply one action to a state.
pub fn reduce(state: &AnnotationState, action: Action, hooks: &HostHooks) -> AnnotationState {
    let tag = action.tag();
    let mut next = state.clone();
    match apply(&mut next, action, hooks) {
        Ok(()) => {
            next.last_action = Some(tag.to_string());
            next.error = None;
            next
        }
        Err(error) => rejected(state, tag, error),
    }
}

/// Parse and apply one JSON action.
///
/// Unknown tags and malformed payloads leave the state unchanged apart from
/// the recorded error.
pub fn reduce_json(state: &AnnotationState, action: &Value, hooks: &HostHooks) -> AnnotationState {
    match Action::from_json(action) {
        Ok(action) => reduce(state, action, hooks),
        Err(error) => {
            let tag = action.get("type").and_then(Value::as_str).unwrap_or_default();
            rejected(state, tag, error)
        }
    }
}

fn rejected(state: &AnnotationState, tag: &str, error: ActionError) -> AnnotationState {
    log::debug!("🚫 {} rejected: {}", tag, error);
    let mut next = state.clone();
    next.last_action = Some(tag.to_string());
    next.error = Some(error);
    next
}

fn apply(state: &mut AnnotationState, action: Action, hooks: &HostHooks) -> Result<(), ActionError> {
    let tag = action.tag();
    let pointer_action = matches!(
        action,
        Action::MouseDown { .. } | Action::MouseMove { .. } | Action::MouseUp { .. }
    );
    // Mouse actions decide for themselves, depending on the tool
    if !action.is_navigation() && !pointer_action {
        ensure_writable(state, tag)?;
    }

    match action {
        Action::SelectTool { selected_tool } => navigation::handle_select_tool(state, selected_tool),
        Action::MouseDown { x, y } => mouse::handle_mouse_down(state, pointer(tag, x, y)?, hooks),
        Action::MouseMove { x, y } => mouse::handle_mouse_move(state, pointer(tag, x, y)?),
        Action::MouseUp { x, y } => mouse::handle_mouse_up(state, pointer(tag, x, y)?),
        Action::BeginBoxTransform {
            region_id,
            directions,
        } => mouse::handle_begin_box_transform(state, region_id, directions),
        Action::BeginMovePolygonPoint {
            region_id,
            point_index,
        } => mouse::handle_begin_move_polygon_point(state, region_id, point_index),
        Action::BeginMoveKeypoint {
            region_id,
            keypoint_id,
        } => mouse::handle_begin_move_keypoint(state, region_id, keypoint_id),
        Action::BeginMovePoint { region_id } => mouse::handle_begin_move_point(state, region_id),
        Action::AddPolygonPoint {
            region_id,
            point,
            point_index,
        } => {
            let point = pointer(tag, point.x, point.y)?;
            region::handle_add_polygon_point(state, region_id, point, point_index)
        }
        Action::SelectRegion { region_id } => region::handle_select_region(state, region_id, hooks),
        Action::ChangeRegion { region } => region::handle_change_region(state, region),
        Action::UpdateRegions { regions } => region::handle_update_regions(state, regions),
        Action::DeleteRegion { region_id } => region::handle_delete_region(state, region_id, hooks),
        Action::OpenRegionEditor { region_id } => {
            region::handle_open_region_editor(state, region_id, hooks)
        }
        Action::CloseRegionEditor { region_id } => {
            region::handle_close_region_editor(state, region_id)
        }
        Action::LinkResource { region_id } => region::handle_link_resource(state, region_id, hooks),
        Action::DeleteKeyframe { time, region_id } => {
            region::handle_delete_keyframe(state, time, region_id)
        }
        Action::ChangeImage { delta } => navigation::handle_change_image(state, delta),
        Action::SelectImage { image_index } => navigation::handle_select_image(state, image_index),
        Action::ChangeVideoTime { new_time } => navigation::handle_change_video_time(state, new_time),
        Action::ChangeVideoPlaying { is_playing } => {
            navigation::handle_change_video_playing(state, is_playing)
        }
        Action::RestoreHistory { index } => navigation::handle_restore_history(state, index),
        Action::RedoHistory => navigation::handle_redo_history(state),
        Action::HeaderButtonClicked { button_name } => {
            navigation::handle_header_button(state, &button_name)
        }
        Action::ImageOrVideoLoaded { metadata } => navigation::handle_image_loaded(state, &metadata),
        Action::Cancel => mouse::handle_cancel(state),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Pointer position from an action, clamped into the image.
fn pointer(tag: &str, x: f64, y: f64) -> Result<Point, ActionError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(ActionError::MalformedAction {
            tag: tag.to_string(),
            message: format!("non-finite position ({}, {})", x, y),
        });
    }
    Ok(Point::new(x, y).clamped())
}

fn ensure_writable(state: &AnnotationState, tag: &str) -> Result<(), ActionError> {
    if state.config.read_only {
        return Err(ActionError::ReadOnly(tag.to_string()));
    }
    Ok(())
}

/// Look up a region of the active image.
fn find_region<'a>(state: &'a AnnotationState, id: &RegionId) -> Result<&'a Region, ActionError> {
    let image = state.active_image().ok_or(ActionError::NoActiveImage)?;
    image
        .region(id)
        .ok_or_else(|| ActionError::RegionNotFound(id.clone()))
}

/// Geometry of a region as shown right now (implied geometry for video).
fn current_shape(state: &AnnotationState, region: &Region) -> Result<Shape, ActionError> {
    if !state.is_video() {
        return Ok(region.shape.clone());
    }
    match state.video.keyframes.track(&region.id) {
        None => Ok(region.shape.clone()),
        Some(track) => track
            .implied_shape(state.video.current_time)
            .ok_or_else(|| ActionError::RegionAbsentAtTime(region.id.clone())),
    }
}

/// Current geometry of a region that may be transformed.
fn editable_shape(state: &AnnotationState, id: &RegionId) -> Result<Shape, ActionError> {
    let region = find_region(state, id)?;
    if region.locked {
        return Err(ActionError::RegionLocked(id.clone()));
    }
    current_shape(state, region)
}

/// Store new geometry for a region; in video mode also keyframe it at the current time.
fn write_shape(state: &mut AnnotationState, id: &RegionId, shape: Shape) -> Result<(), ActionError> {
    let time = state.video.current_time;
    let image = state.active_image_mut().ok_or(ActionError::NoActiveImage)?;
    let region = image
        .region_mut(id)
        .ok_or_else(|| ActionError::RegionNotFound(id.clone()))?;
    region.shape = shape.clone();

    if state.is_video() {
        Arc::make_mut(&mut state.video.keyframes).set_keyframe(id, time, shape);
    }
    Ok(())
}

/// Add a region to the active image (keyframed at the current time for video).
fn insert_region(state: &mut AnnotationState, region: Region) -> Result<(), ActionError> {
    let time = state.video.current_time;
    if state.is_video() {
        Arc::make_mut(&mut state.video.keyframes).set_keyframe(&region.id, time, region.shape.clone());
    }
    let image = state.active_image_mut().ok_or(ActionError::NoActiveImage)?;
    image.regions.push(region);
    Ok(())
}

/// Remove a region, its keyframes, and any selection or gesture on it.
fn remove_region(state: &mut AnnotationState, id: &RegionId) {
    if let Some(image) = state.active_image_mut() {
        image.regions.retain(|r| &r.id != id);
    }
    if state.video.keyframes.track(id).is_some() {
        Arc::make_mut(&mut state.video.keyframes).remove_track(id);
    }
    if state.selected_region_id.as_ref() == Some(id) {
        state.selected_region_id = None;
    }
    if state.mode.region_id() == Some(id) {
        state.mode = Mode::Idle;
    }
}

/// Select one region (or none): the selected region is highlighted, no other is.
fn set_selection(state: &mut AnnotationState, id: Option<&RegionId>) {
    state.selected_region_id = id.cloned();
    let stale = state.active_image().is_some_and(|image| {
        image
            .regions
            .iter()
            .any(|r| r.highlighted != (Some(&r.id) == id))
    });
    if !stale {
        return;
    }
    if let Some(image) = state.active_image_mut() {
        for region in &mut image.regions {
            region.highlighted = Some(&region.id) == id;
        }
    }
}

/// Push the current state to history before a mutation.
fn push_history(state: &mut AnnotationState, name: &str) -> Checkpoint {
    let before = state.snapshot();
    state.history.push(name, Arc::clone(&before));
    Checkpoint { before }
}

/// Return to the state a gesture started from, withdrawing its history entry.
fn restore_checkpoint(state: &mut AnnotationState, checkpoint: &Checkpoint) {
    let mut history = std::mem::take(&mut state.history);
    let pushed_by_gesture = history
        .entries()
        .next()
        .is_some_and(|entry| Arc::ptr_eq(&entry.state, &checkpoint.before));
    if pushed_by_gesture {
        history.pop_latest();
    }
    *state = AnnotationState::clone(&checkpoint.before);
    state.history = history;
    state.mode = Mode::Idle;
}

/// Abort the gesture in progress, discarding its partial geometry.
fn cancel_gesture(state: &mut AnnotationState) {
    match std::mem::take(&mut state.mode) {
        Mode::Creating { checkpoint, .. } | Mode::Transforming { checkpoint, .. } => {
            log::debug!("↩️  Gesture cancelled");
            restore_checkpoint(state, &checkpoint);
        }
        Mode::Panning { start_view, .. } => state.view = start_view,
        Mode::Zooming { .. } | Mode::Idle => {}
    }
}
