//! Pointer gestures: region creation, transforms, pan, zoom and cancel.
//!
//! A drag pushes one history entry when it begins and commits on mouse up.
//! Polygons and expanding lines are drawn click by click and push their entry
//! when the region is created.

use crate::constants::{EXPANDING_LINE_FINISH_THRESHOLD, ZOOM_CLICK_THRESHOLD, ZOOM_FACTOR};
use crate::error::ActionError;
use crate::geometry::{
    Direction, append_line_point, drag_box, handle_anchor, keypoint_scale, move_keypoint,
    move_polygon_point, place_keypoints, resize_box, translate_shape,
};
use crate::hooks::HostHooks;
use crate::model::{
    BoxGeometry, ExpandingLineGeometry, KeypointsGeometry, MIN_POLYGON_VERTICES, Point,
    PolygonGeometry, Region, RegionId, Shape, Tool,
};
use crate::state::{AnnotationState, Checkpoint, Mode, Partial, Transform};
use crate::view::Viewport;

use super::{
    cancel_gesture, current_shape, editable_shape, ensure_writable, find_region, insert_region,
    push_history, restore_checkpoint, set_selection, write_shape,
};

/// Handle `MOUSE_DOWN`.
pub fn handle_mouse_down(
    state: &mut AnnotationState,
    p: Point,
    hooks: &HostHooks,
) -> Result<(), ActionError> {
    hooks.custom_mouse_down.call(());

    match &state.mode {
        Mode::Idle => {}
        Mode::Creating {
            region_id: Some(id),
            partial: Partial::Polygon { .. },
            ..
        } => {
            let id = id.clone();
            return polygon_click(state, &id, p, hooks);
        }
        Mode::Creating {
            region_id: Some(id),
            partial: Partial::ExpandingLine,
            ..
        } => {
            let id = id.clone();
            return line_click(state, &id, p);
        }
        _ => {
            log::trace!("Mouse down ignored, gesture in progress");
            return Ok(());
        }
    }

    match state.selected_tool {
        Tool::Select => select_click(state, p, hooks),
        Tool::Pan => {
            state.mode = Mode::Panning {
                start: p,
                start_view: state.view,
            };
            Ok(())
        }
        Tool::Zoom => {
            state.mode = Mode::Zooming {
                start: p,
                current: p,
            };
            Ok(())
        }
        Tool::ModifyAllowedArea => {
            ensure_writable(state, "MOUSE_DOWN")?;
            let checkpoint = push_history(state, "Modify Allowed Area");
            state.mode = Mode::Creating {
                tool: Tool::ModifyAllowedArea,
                region_id: None,
                partial: Partial::AllowedArea { start: p },
                checkpoint,
            };
            Ok(())
        }
        tool if tool.is_create_tool() => begin_creation(state, tool, p, hooks),
        _ => Ok(()),
    }
}

/// Click with the select tool: select the topmost region and start moving it.
fn select_click(state: &mut AnnotationState, p: Point, hooks: &HostHooks) -> Result<(), ActionError> {
    let Some(region) = state.region_at(&p) else {
        set_selection(state, None);
        return Ok(());
    };

    set_selection(state, Some(&region.id));
    if state.config.read_only || region.locked {
        hooks.custom_select_region.call(region);
        return Ok(());
    }

    let transform = Transform::MoveRegion { anchor: p };
    let checkpoint = push_history(state, transform.name());
    log::debug!("🖐️ Begin move of region {}", region.id);
    state.mode = Mode::Transforming {
        region_id: region.id.clone(),
        original: region.shape.clone(),
        transform,
        checkpoint,
    };
    hooks.custom_select_region.call(region);
    Ok(())
}

fn creation_name(tool: Tool) -> &'static str {
    match tool {
        Tool::CreateBox => "Create Box",
        Tool::CreatePoint => "Create Point",
        Tool::CreatePolygon => "Create Polygon",
        Tool::CreateExpandingLine => "Create Expanding Line",
        Tool::CreateKeypoints => "Create Keypoints",
        _ => "Create Region",
    }
}

/// Start creating a region with a create tool.
fn begin_creation(
    state: &mut AnnotationState,
    tool: Tool,
    p: Point,
    hooks: &HostHooks,
) -> Result<(), ActionError> {
    ensure_writable(state, "MOUSE_DOWN")?;
    if state.active_image().is_none() {
        return Err(ActionError::NoActiveImage);
    }
    if state.allowed_area.is_some_and(|area| !area.contains(&p)) {
        return Err(ActionError::OutsideAllowedArea { x: p.x, y: p.y });
    }

    let (shape, partial) = match tool {
        Tool::CreatePoint => (Shape::Point(p), None),
        Tool::CreateBox => (
            Shape::Box(drag_box(p, p, state.config.min_box_size)),
            Some(Partial::Box { start: p }),
        ),
        Tool::CreatePolygon => (
            Shape::Polygon(PolygonGeometry {
                points: vec![p],
                open: true,
            }),
            Some(Partial::Polygon { preview: None }),
        ),
        Tool::CreateExpandingLine => (
            Shape::ExpandingLine(ExpandingLineGeometry {
                points: vec![p],
                unfinished: true,
                candidate_point: None,
            }),
            Some(Partial::ExpandingLine),
        ),
        Tool::CreateKeypoints => {
            let (definition_id, definition) = state
                .config
                .keypoint_definitions
                .iter()
                .next()
                .ok_or(ActionError::NoKeypointDefinition)?;
            (
                Shape::Keypoints(KeypointsGeometry {
                    keypoints_definition_id: definition_id.clone(),
                    points: place_keypoints(definition, p, 0.0),
                }),
                Some(Partial::Keypoints {
                    center: p,
                    definition_id: definition_id.clone(),
                }),
            )
        }
        _ => return Ok(()),
    };

    let checkpoint = push_history(state, creation_name(tool));
    let (id, color) = state.allocate_region_id()?;
    log::info!("✏️  Created {} region {}", shape.kind(), id);
    insert_region(state, Region::new(id.clone(), shape, color))?;
    set_selection(state, Some(&id));

    if let Some(partial) = partial {
        state.mode = Mode::Creating {
            tool,
            region_id: Some(id),
            partial,
            checkpoint,
        };
    }
    hooks.custom_add_region_click.call(());
    Ok(())
}

/// Click while drawing a polygon: close it near the first vertex, else add a vertex.
fn polygon_click(
    state: &mut AnnotationState,
    id: &RegionId,
    p: Point,
    hooks: &HostHooks,
) -> Result<(), ActionError> {
    let region = find_region(state, id)?.clone();
    let Shape::Polygon(mut polygon) = region.shape.clone() else {
        return Err(ActionError::wrong_kind(id.clone(), "polygon", region.kind()));
    };

    if polygon.points.len() >= MIN_POLYGON_VERTICES {
        let threshold = hooks
            .custom_close_region
            .call(region)
            .flatten()
            .unwrap_or(state.config.polygon_close_threshold);
        let closes = polygon
            .points
            .first()
            .is_some_and(|first| first.distance_to(&p) <= threshold);
        if closes {
            polygon.open = false;
            log::info!("✅ Polygon {} closed with {} points", id, polygon.points.len());
            write_shape(state, id, Shape::Polygon(polygon))?;
            state.mode = Mode::Idle;
            return Ok(());
        }
    }

    polygon.points.push(p);
    log::debug!("➕ Polygon {} point {}", id, polygon.points.len());
    write_shape(state, id, Shape::Polygon(polygon))?;
    if let Mode::Creating {
        partial: Partial::Polygon { preview },
        ..
    } = &mut state.mode
    {
        *preview = None;
    }
    Ok(())
}

/// Click while drawing an expanding line: finish near the last point, else append.
fn line_click(state: &mut AnnotationState, id: &RegionId, p: Point) -> Result<(), ActionError> {
    let region = find_region(state, id)?;
    let Shape::ExpandingLine(line) = &region.shape else {
        return Err(ActionError::wrong_kind(id.clone(), "expanding-line", region.kind()));
    };

    let finishes = line
        .points
        .last()
        .is_some_and(|last| last.distance_to(&p) <= EXPANDING_LINE_FINISH_THRESHOLD);
    if finishes {
        let finished = ExpandingLineGeometry {
            points: line.points.clone(),
            unfinished: false,
            candidate_point: None,
        };
        log::info!("✅ Expanding line {} finished with {} points", id, finished.points.len());
        write_shape(state, id, Shape::ExpandingLine(finished))?;
        state.mode = Mode::Idle;
        return Ok(());
    }

    let extended = append_line_point(line, p);
    write_shape(state, id, Shape::ExpandingLine(extended))
}

/// Handle `MOUSE_MOVE`.
pub fn handle_mouse_move(state: &mut AnnotationState, p: Point) -> Result<(), ActionError> {
    log::trace!("Mouse move ({:.3}, {:.3})", p.x, p.y);
    match state.mode.clone() {
        Mode::Idle => Ok(()),
        Mode::Creating {
            region_id, partial, ..
        } => update_creation(state, region_id.as_ref(), &partial, p),
        Mode::Transforming {
            region_id,
            original,
            transform,
            ..
        } => update_transform(state, &region_id, &original, &transform, p),
        Mode::Panning { start, start_view } => {
            state.view = start_view.pan_by(start.x - p.x, start.y - p.y);
            Ok(())
        }
        Mode::Zooming { start, .. } => {
            state.mode = Mode::Zooming { start, current: p };
            Ok(())
        }
    }
}

fn update_creation(
    state: &mut AnnotationState,
    region_id: Option<&RegionId>,
    partial: &Partial,
    p: Point,
) -> Result<(), ActionError> {
    if let Partial::AllowedArea { start } = partial {
        state.allowed_area = Some(drag_box(*start, p, state.config.min_box_size));
        return Ok(());
    }
    let Some(id) = region_id else {
        return Ok(());
    };

    match partial {
        Partial::Box { start } => {
            let b = drag_box(*start, p, state.config.min_box_size);
            write_shape(state, id, Shape::Box(b))
        }
        Partial::Polygon { .. } => {
            if let Mode::Creating {
                partial: Partial::Polygon { preview },
                ..
            } = &mut state.mode
            {
                *preview = Some(p);
            }
            Ok(())
        }
        Partial::ExpandingLine => {
            let region = find_region(state, id)?;
            let Shape::ExpandingLine(line) = &region.shape else {
                return Err(ActionError::wrong_kind(id.clone(), "expanding-line", region.kind()));
            };
            let mut line = line.clone();
            line.candidate_point = Some(p);
            write_shape(state, id, Shape::ExpandingLine(line))
        }
        Partial::Keypoints {
            center,
            definition_id,
        } => {
            let definition = state
                .config
                .keypoint_definitions
                .get(definition_id)
                .ok_or(ActionError::NoKeypointDefinition)?;
            let scale = keypoint_scale(definition, *center, p);
            let shape = Shape::Keypoints(KeypointsGeometry {
                keypoints_definition_id: definition_id.clone(),
                points: place_keypoints(definition, *center, scale),
            });
            write_shape(state, id, shape)
        }
        Partial::AllowedArea { .. } => Ok(()),
    }
}

fn update_transform(
    state: &mut AnnotationState,
    id: &RegionId,
    original: &Shape,
    transform: &Transform,
    p: Point,
) -> Result<(), ActionError> {
    let shape = match (transform, original) {
        (
            Transform::ResizeBox {
                original,
                directions,
                anchor: Some(anchor),
            },
            _,
        ) => Shape::Box(resize_box(
            original,
            directions,
            *anchor,
            p,
            state.config.min_box_size,
        )),
        (Transform::ResizeBox { anchor: None, .. }, _) => {
            // A move without a handle is anchored at the first pointer position
            if let Mode::Transforming {
                transform: Transform::ResizeBox { anchor, .. },
                ..
            } = &mut state.mode
            {
                *anchor = Some(p);
            }
            return Ok(());
        }
        (Transform::MoveRegion { anchor }, _) => {
            translate_shape(original, p.x - anchor.x, p.y - anchor.y)
        }
        (Transform::MovePolygonPoint { point_index }, Shape::Polygon(polygon)) => {
            let moved = move_polygon_point(polygon, *point_index, p).ok_or_else(|| {
                ActionError::PointIndexOutOfRange {
                    id: id.clone(),
                    index: *point_index,
                    len: polygon.points.len(),
                }
            })?;
            Shape::Polygon(moved)
        }
        (Transform::MoveKeypoint { keypoint_id }, Shape::Keypoints(keypoints)) => {
            let moved = move_keypoint(keypoints, keypoint_id, p).ok_or_else(|| {
                ActionError::KeypointNotFound {
                    id: id.clone(),
                    keypoint: keypoint_id.clone(),
                }
            })?;
            Shape::Keypoints(moved)
        }
        (Transform::MovePoint, Shape::Point(_)) => Shape::Point(p),
        (_, shape) => {
            let expected = match transform {
                Transform::MovePolygonPoint { .. } => "polygon",
                Transform::MoveKeypoint { .. } => "keypoints",
                _ => "point",
            };
            return Err(ActionError::wrong_kind(id.clone(), expected, shape.kind()));
        }
    };
    write_shape(state, id, shape)
}

/// Handle `MOUSE_UP`.
pub fn handle_mouse_up(state: &mut AnnotationState, p: Point) -> Result<(), ActionError> {
    match state.mode.clone() {
        Mode::Idle => Ok(()),
        // Drawn click by click; mouse up does not end these
        Mode::Creating {
            partial: Partial::Polygon { .. } | Partial::ExpandingLine,
            ..
        } => Ok(()),
        Mode::Creating {
            region_id,
            partial,
            checkpoint,
            ..
        } => {
            update_creation(state, region_id.as_ref(), &partial, p)?;
            finish_creation(state, region_id.as_ref(), &partial, &checkpoint, p)
        }
        Mode::Transforming {
            region_id,
            original,
            transform,
            checkpoint,
        } => {
            update_transform(state, &region_id, &original, &transform, p)?;
            let region = find_region(state, &region_id)?;
            if current_shape(state, region)? == original {
                // Nothing moved: a plain click, keep history clean
                restore_checkpoint(state, &checkpoint);
            } else {
                log::info!("✅ {} of region {} committed", transform.name(), region_id);
                state.mode = Mode::Idle;
            }
            Ok(())
        }
        Mode::Panning { start, start_view } => {
            state.view = start_view.pan_by(start.x - p.x, start.y - p.y);
            state.mode = Mode::Idle;
            Ok(())
        }
        Mode::Zooming { start, .. } => {
            state.view = if start.distance_to(&p) < ZOOM_CLICK_THRESHOLD {
                let zoom = state.view.zoom * ZOOM_FACTOR;
                state.view.zoom_to_cursor(zoom, p)
            } else {
                Viewport::fit_box(&BoxGeometry::from_corners(start, p))
            };
            log::debug!("🔍 Zoom: {:.2}x", state.view.zoom);
            state.mode = Mode::Idle;
            Ok(())
        }
    }
}

fn finish_creation(
    state: &mut AnnotationState,
    region_id: Option<&RegionId>,
    partial: &Partial,
    checkpoint: &Checkpoint,
    p: Point,
) -> Result<(), ActionError> {
    let min_drag = state.config.new_box_min_drag;
    match partial {
        Partial::Box { start } | Partial::AllowedArea { start } => {
            let drag = (p.x - start.x).abs().max((p.y - start.y).abs());
            if drag < min_drag {
                log::debug!("🗑️ Discarded box smaller than the drag threshold");
                restore_checkpoint(state, checkpoint);
                return Ok(());
            }
        }
        Partial::Keypoints {
            center,
            definition_id,
        } => {
            // A click without a drag places the skeleton at its default size
            let definition = state.config.keypoint_definitions.get(definition_id);
            if let (Some(id), Some(definition)) = (region_id, definition) {
                if center.distance_to(&p) < min_drag {
                    let shape = Shape::Keypoints(KeypointsGeometry {
                        keypoints_definition_id: definition_id.clone(),
                        points: place_keypoints(definition, *center, 1.0),
                    });
                    write_shape(state, id, shape)?;
                }
            }
        }
        Partial::Polygon { .. } | Partial::ExpandingLine => {}
    }
    state.mode = Mode::Idle;
    Ok(())
}

fn start_transform(
    state: &mut AnnotationState,
    region_id: RegionId,
    original: Shape,
    transform: Transform,
) -> Result<(), ActionError> {
    let checkpoint = push_history(state, transform.name());
    log::debug!("🖐️ Begin {} on region {}", transform.name(), region_id);
    state.mode = Mode::Transforming {
        region_id,
        original,
        transform,
        checkpoint,
    };
    Ok(())
}

/// Handle `BEGIN_BOX_TRANSFORM`.
pub fn handle_begin_box_transform(
    state: &mut AnnotationState,
    region_id: RegionId,
    mut directions: Vec<Direction>,
) -> Result<(), ActionError> {
    cancel_gesture(state);
    let shape = editable_shape(state, &region_id)?;
    let Shape::Box(b) = shape else {
        return Err(ActionError::wrong_kind(region_id, "box", shape.kind()));
    };
    directions.sort();
    directions.dedup();
    let anchor = (!directions.is_empty()).then(|| handle_anchor(&b, &directions));
    let transform = Transform::ResizeBox {
        original: b,
        directions,
        anchor,
    };
    start_transform(state, region_id, shape, transform)
}

/// Handle `BEGIN_MOVE_POLYGON_POINT`.
pub fn handle_begin_move_polygon_point(
    state: &mut AnnotationState,
    region_id: RegionId,
    point_index: usize,
) -> Result<(), ActionError> {
    cancel_gesture(state);
    let shape = editable_shape(state, &region_id)?;
    let Shape::Polygon(polygon) = &shape else {
        return Err(ActionError::wrong_kind(region_id, "polygon", shape.kind()));
    };
    if point_index >= polygon.points.len() {
        return Err(ActionError::PointIndexOutOfRange {
            id: region_id,
            index: point_index,
            len: polygon.points.len(),
        });
    }
    start_transform(state, region_id, shape, Transform::MovePolygonPoint { point_index })
}

/// Handle `BEGIN_MOVE_KEYPOINT`.
pub fn handle_begin_move_keypoint(
    state: &mut AnnotationState,
    region_id: RegionId,
    keypoint_id: String,
) -> Result<(), ActionError> {
    cancel_gesture(state);
    let shape = editable_shape(state, &region_id)?;
    let Shape::Keypoints(keypoints) = &shape else {
        return Err(ActionError::wrong_kind(region_id, "keypoints", shape.kind()));
    };
    if !keypoints.points.contains_key(&keypoint_id) {
        return Err(ActionError::KeypointNotFound {
            id: region_id,
            keypoint: keypoint_id,
        });
    }
    start_transform(state, region_id, shape, Transform::MoveKeypoint { keypoint_id })
}

/// Handle `BEGIN_MOVE_POINT`.
pub fn handle_begin_move_point(
    state: &mut AnnotationState,
    region_id: RegionId,
) -> Result<(), ActionError> {
    cancel_gesture(state);
    let shape = editable_shape(state, &region_id)?;
    if !matches!(shape, Shape::Point(_)) {
        return Err(ActionError::wrong_kind(region_id, "point", shape.kind()));
    }
    start_transform(state, region_id, shape, Transform::MovePoint)
}

/// Handle `CANCEL`.
///
/// Aborts the gesture in progress. Without one, closes open region editors,
/// or failing that clears the selection.
pub fn handle_cancel(state: &mut AnnotationState) -> Result<(), ActionError> {
    if !state.mode.is_idle() {
        cancel_gesture(state);
        return Ok(());
    }

    let editing = state
        .active_image()
        .is_some_and(|image| image.regions.iter().any(|r| r.editing_labels));
    if editing {
        if let Some(image) = state.active_image_mut() {
            for region in &mut image.regions {
                region.editing_labels = false;
            }
        }
    } else {
        set_selection(state, None);
    }
    Ok(())
}
