//! Unit kind and lifecycle enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of deployable unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A plain resource stack (roles, functions, endpoints).
    #[default]
    Resource,
    /// A stack that owns a pipeline graph.
    Pipeline,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource => write!(f, "resource"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Lifecycle of a deployable unit.
///
/// `Declared -> Ordered -> Handed`; no state moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Declared but not yet ordered.
    Declared,
    /// Assigned a position in the resolved order.
    Ordered,
    /// Passed to the external executor.
    Handed,
}

impl UnitState {
    /// Returns true if moving to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Declared, Self::Ordered) | (Self::Ordered, Self::Handed)
        )
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "declared"),
            Self::Ordered => write!(f, "ordered"),
            Self::Handed => write!(f, "handed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(UnitState::Declared.can_transition_to(UnitState::Ordered));
        assert!(UnitState::Ordered.can_transition_to(UnitState::Handed));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!UnitState::Declared.can_transition_to(UnitState::Handed));
        assert!(!UnitState::Ordered.can_transition_to(UnitState::Declared));
        assert!(!UnitState::Handed.can_transition_to(UnitState::Ordered));
        assert!(!UnitState::Handed.can_transition_to(UnitState::Handed));
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(serde_json::to_string(&UnitKind::Pipeline).unwrap(), "\"pipeline\"");
        assert_eq!(UnitKind::default().to_string(), "resource");
    }
}
