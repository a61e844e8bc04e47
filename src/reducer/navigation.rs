//! Tools, image navigation, video playback, header buttons and history.
//!
//! Only the header `Clone` button pushes history. Out-of-range navigation is
//! clamped, not an error.

use crate::action::{HeaderButton, LoadedMetadata};
use crate::error::ActionError;
use crate::model::{RealSize, Tool};
use crate::state::{AnnotationState, Mode};

use super::region::clone_regions_to_next_image;
use super::{cancel_gesture, ensure_writable, set_selection};

/// Handle `SELECT_TOOL`.
pub fn handle_select_tool(state: &mut AnnotationState, tool: Tool) -> Result<(), ActionError> {
    if !state.config.is_tool_enabled(tool) {
        return Err(ActionError::ToolDisabled(tool.name().to_string()));
    }
    if state.config.read_only && (tool.is_create_tool() || tool == Tool::ModifyAllowedArea) {
        return Err(ActionError::ReadOnly("SELECT_TOOL".to_string()));
    }

    match tool {
        Tool::ShowTags => state.show_tags = !state.show_tags,
        Tool::ShowMask => state.show_mask = !state.show_mask,
        Tool::Fullscreen => state.full_screen = true,
        Tool::Window => state.full_screen = false,
        _ => {
            cancel_gesture(state);
            state.selected_tool = tool;
        }
    }
    log::debug!("🔧 Tool: {}", tool);
    Ok(())
}

fn go_to_image(state: &mut AnnotationState, index: usize) {
    if index == state.selected_image_index {
        return;
    }
    cancel_gesture(state);
    set_selection(state, None);
    state.selected_image_index = index;
    log::debug!("🖼️ Image {}/{}", index + 1, state.images.len());
}

/// Handle `CHANGE_IMAGE`: step through images without wrapping around.
pub fn handle_change_image(state: &mut AnnotationState, delta: i64) -> Result<(), ActionError> {
    let Some(last) = state.images.len().checked_sub(1) else {
        return Ok(());
    };
    let current = i64::try_from(state.selected_image_index).unwrap_or(i64::MAX);
    let last_index = i64::try_from(last).unwrap_or(i64::MAX);
    let target = current.saturating_add(delta).clamp(0, last_index);
    go_to_image(state, usize::try_from(target).unwrap_or(last));
    Ok(())
}

/// Handle `SELECT_IMAGE`: jump to an image, clamped to the last one.
pub fn handle_select_image(state: &mut AnnotationState, index: usize) -> Result<(), ActionError> {
    let Some(last) = state.images.len().checked_sub(1) else {
        return Ok(());
    };
    go_to_image(state, index.min(last));
    Ok(())
}

/// Handle `CHANGE_VIDEO_TIME`.
pub fn handle_change_video_time(state: &mut AnnotationState, time: f64) -> Result<(), ActionError> {
    if !time.is_finite() {
        return Err(ActionError::InvalidTime(time));
    }
    let time = time.clamp(0.0, state.video.duration);
    // Gesture geometry belongs to the frame it started on
    if time != state.video.current_time
        && matches!(state.mode, Mode::Creating { .. } | Mode::Transforming { .. })
    {
        cancel_gesture(state);
    }
    state.video.current_time = time;
    log::trace!("⏱️ Video time {:.3}s", state.video.current_time);
    Ok(())
}

/// Handle `CHANGE_VIDEO_PLAYING`.
pub fn handle_change_video_playing(
    state: &mut AnnotationState,
    playing: bool,
) -> Result<(), ActionError> {
    state.video.playing = playing;
    log::debug!("{} Video", if playing { "▶️" } else { "⏸️" });
    Ok(())
}

/// Handle `HEADER_BUTTON_CLICKED`. Unrecognized buttons are only recorded.
pub fn handle_header_button(state: &mut AnnotationState, name: &str) -> Result<(), ActionError> {
    let config = state.config.clone();
    match HeaderButton::from_name(name) {
        Some(HeaderButton::Prev) if !config.disable_navs => handle_change_image(state, -1)?,
        Some(HeaderButton::Next) if !config.disable_navs => handle_change_image(state, 1)?,
        Some(HeaderButton::Play) => state.video.playing = true,
        Some(HeaderButton::Pause) => state.video.playing = false,
        Some(HeaderButton::Fullscreen) => state.full_screen = true,
        Some(HeaderButton::Window) => state.full_screen = false,
        Some(HeaderButton::Clone) => {
            ensure_writable(state, "HEADER_BUTTON_CLICKED")?;
            clone_regions_to_next_image(state)?;
        }
        Some(HeaderButton::Settings) if !config.disable_settings => {
            state.settings_open = !state.settings_open;
        }
        _ => log::debug!("Header button '{}' recorded", name),
    }
    Ok(())
}

/// Handle `IMAGE_OR_VIDEO_LOADED`: fill in the real size and video duration.
pub fn handle_image_loaded(
    state: &mut AnnotationState,
    metadata: &LoadedMetadata,
) -> Result<(), ActionError> {
    let valid_size = |v: f64| v.is_finite() && v > 0.0;
    if !valid_size(metadata.natural_width) || !valid_size(metadata.natural_height) {
        return Err(ActionError::MalformedAction {
            tag: "IMAGE_OR_VIDEO_LOADED".to_string(),
            message: format!(
                "invalid natural size {}x{}",
                metadata.natural_width, metadata.natural_height
            ),
        });
    }

    let image = state.active_image().ok_or(ActionError::NoActiveImage)?;
    if image.real_size.is_none() {
        if let Some(image) = state.active_image_mut() {
            image.real_size = Some(RealSize {
                width: metadata.natural_width,
                height: metadata.natural_height,
                unit_name: "px".to_string(),
            });
        }
    }

    if let Some(duration) = metadata.duration {
        if state.is_video() && duration.is_finite() && duration >= 0.0 {
            state.video.duration = duration;
            state.video.current_time = state.video.current_time.min(duration);
        }
    }
    log::info!(
        "📷 Loaded {}x{}",
        metadata.natural_width,
        metadata.natural_height
    );
    Ok(())
}

/// Handle `RESTORE_HISTORY`: make a past snapshot the present.
pub fn handle_restore_history(state: &mut AnnotationState, index: usize) -> Result<(), ActionError> {
    let present = state.snapshot();
    let mut history = std::mem::take(&mut state.history);
    let target = history
        .restore(index, present)
        .ok_or(ActionError::NoHistoryEntry(index))?;

    *state = AnnotationState::clone(&target);
    state.history = history;
    state.mode = Mode::Idle;
    log::info!("⏪ Restored history entry {}", index);
    Ok(())
}

/// Handle `REDO_HISTORY`: re-apply the most recently undone snapshot.
pub fn handle_redo_history(state: &mut AnnotationState) -> Result<(), ActionError> {
    let present = state.snapshot();
    let mut history = std::mem::take(&mut state.history);
    let target = history.redo(present).ok_or(ActionError::NothingToRedo)?;

    *state = AnnotationState::clone(&target);
    state.history = history;
    state.mode = Mode::Idle;
    log::info!("⏩ Redo");
    Ok(())
}
