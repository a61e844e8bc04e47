//! Editor state: the root annotation state and the gesture descriptor.

mod annotation_state;
mod mode;

pub use annotation_state::{AnnotationState, AnnotationType, Session, VideoState};
pub use mode::{Checkpoint, Mode, Partial, Transform};
