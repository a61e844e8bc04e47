//! Reducer tests, driven through `reduce` the way a host dispatches.

mod history;

use crate::action::Action;
use crate::config::EditorConfig;
use crate::hooks::HostHooks;
use crate::model::{BoxGeometry, Image, Region, RegionId, Shape};
use crate::state::{AnnotationState, Session};

use super::reduce;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn box_region(id: u64, x: f64, y: f64, w: f64, h: f64) -> Region {
    Region::new(id, Shape::Box(BoxGeometry::new(x, y, w, h)), "#ff0000")
}

fn state_with_config(regions: Vec<Region>, config: EditorConfig) -> AnnotationState {
    let session = Session::new(vec![Image::new("image.png", "image.png").with_regions(regions)]);
    AnnotationState::from_session(session, config).expect("valid session")
}

fn state_with(regions: Vec<Region>) -> AnnotationState {
    state_with_config(regions, EditorConfig::default())
}

/// Apply actions in order without hooks.
fn dispatch(state: &AnnotationState, actions: impl IntoIterator<Item = Action>) -> AnnotationState {
    dispatch_with(state, actions, &HostHooks::default())
}

fn dispatch_with(
    state: &AnnotationState,
    actions: impl IntoIterator<Item = Action>,
    hooks: &HostHooks,
) -> AnnotationState {
    actions
        .into_iter()
        .fold(state.clone(), |state, action| reduce(&state, action, hooks))
}

fn region_box(state: &AnnotationState, id: u64) -> BoxGeometry {
    match state.region(&RegionId::Number(id)).map(|r| &r.shape) {
        Some(Shape::Box(b)) => *b,
        other => panic!("region {} is not a box: {:?}", id, other),
    }
}

fn mouse_down(x: f64, y: f64) -> Action {
    Action::MouseDown { x, y }
}

fn mouse_move(x: f64, y: f64) -> Action {
    Action::MouseMove { x, y }
}

fn mouse_up(x: f64, y: f64) -> Action {
    Action::MouseUp { x, y }
}
