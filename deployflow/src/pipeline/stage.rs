//! Stages: ordered execution barriers holding ranked actions.

use crate::core::{validate_name, Action};
use crate::errors::{ComposerError, ComposerResult};
use std::collections::BTreeMap;

/// A named barrier of actions.
///
/// Actions sharing a rank form one concurrent batch; batches run in
/// ascending rank order and the stage completes when the last batch does.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    actions: Vec<Action>,
}

impl Stage {
    /// Creates an empty stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Adds an action.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAction` if the stage already holds an action with the
    /// same name, or `InvalidName` for a malformed action name.
    pub fn add_action(&mut self, action: Action) -> ComposerResult<()> {
        validate_name("action", action.name())?;
        if self.actions.contains(&action) {
            return Err(ComposerError::DuplicateAction {
                action: action.name().to_string(),
                scope: format!("stage '{}'", self.name),
            });
        }
        self.actions.push(action);
        Ok(())
    }

    /// Adds an action, builder style.
    ///
    /// # Errors
    ///
    /// Same as [`Stage::add_action`].
    pub fn with_action(mut self, action: Action) -> ComposerResult<Self> {
        self.add_action(action)?;
        Ok(self)
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the actions in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Looks up an action by name.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name() == name)
    }

    /// Returns true if the stage holds no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Groups actions by rank, ascending.
    ///
    /// Inside a batch actions keep their declaration order, so the result is
    /// deterministic for a given stage.
    #[must_use]
    pub fn execution_batches(&self) -> Vec<Vec<&Action>> {
        let mut by_rank: BTreeMap<u32, Vec<&Action>> = BTreeMap::new();
        for action in &self.actions {
            by_rank.entry(action.rank()).or_default().push(action);
        }
        by_rank.into_values().collect()
    }
}
