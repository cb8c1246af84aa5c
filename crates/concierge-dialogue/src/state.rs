//! Conversation state with validated transitions.
//!
//! - Idle -> Processing (free text, option or quick reply)
//! - AwaitingSelection -> Processing (option chosen or text typed)
//! - Processing -> AwaitingSelection (submenu or listing rendered)
//! - Processing -> Idle (leaf answered, clarification, failure, goodbye)
//!
//! There is no terminal state. A language switch resets to Idle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DialogueError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogueState {
    /// Nothing outstanding. Free text and quick replies are accepted.
    #[default]
    Idle,
    /// A menu is on screen and the user is expected to pick from it.
    AwaitingSelection,
    /// One exchange is in flight. All further input is ignored.
    Processing,
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogueState::Idle => write!(f, "Idle"),
            DialogueState::AwaitingSelection => write!(f, "AwaitingSelection"),
            DialogueState::Processing => write!(f, "Processing"),
        }
    }
}

impl DialogueState {
    pub fn can_transition_to(&self, target: &DialogueState) -> bool {
        matches!(
            (self, target),
            (DialogueState::Idle, DialogueState::Processing)
                | (DialogueState::AwaitingSelection, DialogueState::Processing)
                | (DialogueState::Processing, DialogueState::AwaitingSelection)
                | (DialogueState::Processing, DialogueState::Idle)
        )
    }

    /// Validate and perform a transition in place.
    pub fn transition(&mut self, target: DialogueState) -> Result<(), DialogueError> {
        if self.can_transition_to(&target) {
            tracing::debug!("Dialogue state: {} -> {}", self, target);
            *self = target;
            Ok(())
        } else {
            Err(DialogueError::InvalidTransition {
                from: *self,
                to: target,
            })
        }
    }

    pub fn is_processing(&self) -> bool {
        *self == DialogueState::Processing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(DialogueState::Idle.to_string(), "Idle");
        assert_eq!(
            DialogueState::AwaitingSelection.to_string(),
            "AwaitingSelection"
        );
        assert_eq!(DialogueState::Processing.to_string(), "Processing");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(DialogueState::Idle.can_transition_to(&DialogueState::Processing));
        assert!(DialogueState::AwaitingSelection.can_transition_to(&DialogueState::Processing));
        assert!(DialogueState::Processing.can_transition_to(&DialogueState::AwaitingSelection));
        assert!(DialogueState::Processing.can_transition_to(&DialogueState::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        // Single flight: no re-entry into Processing
        assert!(!DialogueState::Processing.can_transition_to(&DialogueState::Processing));
        assert!(!DialogueState::Idle.can_transition_to(&DialogueState::AwaitingSelection));
        assert!(!DialogueState::AwaitingSelection.can_transition_to(&DialogueState::Idle));
        assert!(!DialogueState::Idle.can_transition_to(&DialogueState::Idle));
    }

    #[test]
    fn test_transition_in_place() {
        let mut state = DialogueState::default();
        state.transition(DialogueState::Processing).unwrap();
        assert!(state.is_processing());
        state.transition(DialogueState::AwaitingSelection).unwrap();
        assert_eq!(state, DialogueState::AwaitingSelection);
    }

    #[test]
    fn test_rejected_transition_leaves_state() {
        let mut state = DialogueState::Processing;
        let err = state.transition(DialogueState::Processing).unwrap_err();
        assert!(matches!(
            err,
            DialogueError::InvalidTransition {
                from: DialogueState::Processing,
                to: DialogueState::Processing
            }
        ));
        assert_eq!(state, DialogueState::Processing);
    }

    #[test]
    fn test_full_cycle() {
        let mut state = DialogueState::Idle;
        for next in [
            DialogueState::Processing,
            DialogueState::AwaitingSelection,
            DialogueState::Processing,
            DialogueState::Idle,
        ] {
            state.transition(next).unwrap();
        }
        assert_eq!(state, DialogueState::Idle);
    }
}
