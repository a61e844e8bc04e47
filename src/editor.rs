//! Stateful driver around the reducer.
//!
//! Hosts that do not want to thread states through [`crate::reduce`] keep an
//! [`Editor`]: it owns the current state and the host hooks and replaces the
//! state on every dispatch.

use serde_json::Value;

use crate::action::Action;
use crate::config::EditorConfig;
use crate::error::{ActionError, RegionError};
use crate::hooks::HostHooks;
use crate::reducer::{reduce, reduce_json};
use crate::state::{AnnotationState, Session};

/// The current state plus the hooks it is reduced with.
#[derive(Debug)]
pub struct Editor {
    state: AnnotationState,
    hooks: HostHooks,
}

impl Editor {
    pub fn new(state: AnnotationState, hooks: HostHooks) -> Self {
        Self { state, hooks }
    }

    /// Load a session without hooks.
    pub fn from_session(session: Session, config: EditorConfig) -> Result<Self, RegionError> {
        Ok(Self::new(
            AnnotationState::from_session(session, config)?,
            HostHooks::default(),
        ))
    }

    /// Builder: attach host hooks.
    pub fn with_hooks(mut self, hooks: HostHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Apply one action. A rejected action still becomes the new state (with
    /// its error recorded); the error is also returned.
    pub fn dispatch(&mut self, action: Action) -> Result<(), ActionError> {
        self.state = reduce(&self.state, action, &self.hooks);
        self.check()
    }

    /// Apply one JSON action.
    pub fn dispatch_json(&mut self, action: &Value) -> Result<(), ActionError> {
        self.state = reduce_json(&self.state, action, &self.hooks);
        self.check()
    }

    fn check(&self) -> Result<(), ActionError> {
        match &self.state.error {
            Some(error) => {
                log::warn!(
                    "⚠️ {} failed: {}",
                    self.state.last_action.as_deref().unwrap_or("action"),
                    error
                );
                Err(error.clone())
            }
            None => Ok(()),
        }
    }

    pub fn state(&self) -> &AnnotationState {
        &self.state
    }

    pub fn hooks(&self) -> &HostHooks {
        &self.hooks
    }

    pub fn into_state(self) -> AnnotationState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::model::{Image, Point, Region, RegionId, Shape};

    fn editor() -> Editor {
        let image = Image::new("a.png", "a.png").with_regions(vec![Region::new(
            1,
            Shape::Point(Point::new(0.5, 0.5)),
            "#fff",
        )]);
        Editor::from_session(Session::new(vec![image]), EditorConfig::default())
            .expect("valid session")
    }

    #[test]
    fn test_dispatch_reports_errors() {
        let mut editor = editor();
        assert_eq!(
            editor.dispatch(Action::DeleteRegion {
                region_id: RegionId::Number(2)
            }),
            Err(ActionError::RegionNotFound(RegionId::Number(2)))
        );
        assert_eq!(editor.state().last_action.as_deref(), Some("DELETE_REGION"));

        assert_eq!(
            editor.dispatch_json(&json!({"type": "DELETE_REGION", "regionId": 1})),
            Ok(())
        );
        assert!(editor.state().region(&RegionId::Number(1)).is_none());
        assert_eq!(editor.state().error, None);
    }

    #[test]
    fn test_hooks_are_used() {
        let deleted = Rc::new(Cell::new(false));
        let flag = deleted.clone();
        let mut editor =
            editor().with_hooks(HostHooks::new().on_delete_region(move |_| flag.set(true)));

        editor
            .dispatch(Action::DeleteRegion {
                region_id: RegionId::Number(1),
            })
            .expect("delete");
        assert!(deleted.get());
        assert!(editor.hooks().custom_delete_region.is_some());
        assert_eq!(editor.into_state().history.len(), 1);
    }
}
