//! State machine trait for lifecycle status enums.

use super::ValidationError;

/// A status enum whose values form a directed transition graph.
///
/// Implementors list the legal edges; `transition_to` is the checked way
/// to move along one.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if moving from `self` to `target` is a legal edge.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns every status reachable from `self` in one step.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs a checked transition.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// True when no further transitions exist.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
