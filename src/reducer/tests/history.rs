use super::*;
use crate::error::ActionError;

fn move_to(x: f64) -> Action {
    Action::ChangeRegion {
        region: box_region(1, x, 0.1, 0.2, 0.2),
    }
}

#[test]
fn test_history_is_bounded() {
    let config = EditorConfig::default().with_history_limit(3);
    let state = state_with_config(vec![box_region(1, 0.0, 0.1, 0.2, 0.2)], config);
    let state = dispatch(&state, (1..=6).map(|i| move_to(i as f64 * 0.1)));

    assert_eq!(state.history.len(), 3);
    assert!(approx_eq(region_box(&state, 1).x, 0.6));
}

#[test]
fn test_navigation_does_not_enter_history() {
    let state = state_with(vec![box_region(1, 0.0, 0.1, 0.2, 0.2)]);
    let state = dispatch(
        &state,
        [
            Action::SelectRegion {
                region_id: Some(RegionId::Number(1)),
            },
            Action::SelectTool {
                selected_tool: crate::model::Tool::Pan,
            },
            Action::ChangeImage { delta: 1 },
            Action::HeaderButtonClicked {
                button_name: "fullscreen".to_string(),
            },
        ],
    );
    assert!(state.history.is_empty());
}

#[test]
fn test_restore_then_redo() {
    let state = state_with(vec![box_region(1, 0.0, 0.1, 0.2, 0.2)]);
    let edited = dispatch(&state, [move_to(0.1), move_to(0.2)]);
    assert_eq!(edited.history.names(), vec!["Change Region", "Change Region"]);

    let undone = dispatch(&edited, [Action::RestoreHistory { index: 0 }]);
    assert!(approx_eq(region_box(&undone, 1).x, 0.1));
    assert_eq!(undone.history.len(), 1);
    assert!(undone.history.can_redo());

    let undone_twice = dispatch(&undone, [Action::RestoreHistory { index: 0 }]);
    assert!(approx_eq(region_box(&undone_twice, 1).x, 0.0));
    assert_eq!(undone_twice.history.redo_count(), 2);

    let redone = dispatch(&undone_twice, [Action::RedoHistory, Action::RedoHistory]);
    assert_eq!(redone.images, edited.images);
    assert_eq!(redone.history.len(), 2);
    assert!(!redone.history.can_redo());
}

#[test]
fn test_restore_older_entry_directly() {
    let state = state_with(vec![box_region(1, 0.0, 0.1, 0.2, 0.2)]);
    let edited = dispatch(&state, [move_to(0.1), move_to(0.2), move_to(0.3)]);
    let undone = dispatch(&edited, [Action::RestoreHistory { index: 2 }]);

    assert_eq!(undone.images, state.images);
    assert!(undone.history.is_empty());
    assert_eq!(undone.history.redo_count(), 3);
}

#[test]
fn test_undo_then_replay_matches_never_undoing() {
    let state = state_with(vec![box_region(1, 0.0, 0.1, 0.2, 0.2)]);
    let actions = vec![
        move_to(0.1),
        Action::SelectTool {
            selected_tool: crate::model::Tool::CreatePoint,
        },
        mouse_down(0.8, 0.8),
        move_to(0.3),
    ];
    let direct = dispatch(&state, actions.clone());

    // Entries: [before move_to(0.3), before point, before move_to(0.1)]
    let undone = dispatch(&direct, [Action::RestoreHistory { index: 1 }]);
    let replayed = dispatch(&undone, actions[2..].iter().cloned());

    assert_eq!(replayed.images, direct.images);
    assert_eq!(replayed.selected_region_id, direct.selected_region_id);
    assert_eq!(replayed.next_region_id, direct.next_region_id);
    assert_eq!(replayed.history.names(), direct.history.names());
}

#[test]
fn test_new_edit_discards_redo() {
    let state = state_with(vec![box_region(1, 0.0, 0.1, 0.2, 0.2)]);
    let state = dispatch(
        &state,
        [move_to(0.1), Action::RestoreHistory { index: 0 }, move_to(0.4)],
    );
    assert!(!state.history.can_redo());

    let next = dispatch(&state, [Action::RedoHistory]);
    assert_eq!(next.error, Some(ActionError::NothingToRedo));
    assert_eq!(next.images, state.images);
}

#[test]
fn test_restore_missing_entry() {
    let state = state_with(vec![box_region(1, 0.0, 0.1, 0.2, 0.2)]);
    let next = dispatch(&state, [Action::RestoreHistory { index: 5 }]);
    assert_eq!(next.error, Some(ActionError::NoHistoryEntry(5)));
    assert_eq!(next.last_action.as_deref(), Some("RESTORE_HISTORY"));
}

#[test]
fn test_restore_during_gesture_ends_it() {
    let state = state_with(vec![box_region(1, 0.25, 0.25, 0.5, 0.5)]);
    let state = dispatch(
        &state,
        [
            move_to(0.1),
            Action::BeginBoxTransform {
                region_id: RegionId::Number(1),
                directions: vec![crate::geometry::Direction::S],
            },
            mouse_move(0.2, 0.3),
            Action::RestoreHistory { index: 1 },
        ],
    );
    assert!(state.mode.is_idle());
    assert_eq!(region_box(&state, 1), crate::model::BoxGeometry::new(0.25, 0.25, 0.5, 0.5));
}
