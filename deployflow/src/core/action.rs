//! Actions and their opaque resource descriptors.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Default rank for actions that do not declare one.
pub const DEFAULT_RANK: u32 = 1;

/// Identifies an action across a pipeline graph.
///
/// Action names are only unique within their stage, so the owning stage is
/// part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId {
    /// The owning stage.
    pub stage: String,
    /// The action name.
    pub action: String,
}

impl ActionId {
    /// Creates a new action id.
    #[must_use]
    pub fn new(stage: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stage, self.action)
    }
}

/// Opaque configuration attached to an action.
///
/// Build commands, compute sizes, environment variables and permission
/// grants live here. The composer never interprets the values; they are
/// passed through to whatever executes the plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceDescriptor(BTreeMap<String, serde_json::Value>);

impl ResourceDescriptor {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a top-level entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Sets the commands for a build phase under `phases.<phase>.commands`.
    #[must_use]
    pub fn with_phase_commands(mut self, phase: &str, commands: &[&str]) -> Self {
        self.object_entry("phases")[phase] = serde_json::json!({ "commands": commands });
        self
    }

    /// Adds an environment variable under `environment_variables`.
    #[must_use]
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key: String = key.into();
        self.object_entry("environment_variables")[key.as_str()] =
            serde_json::Value::String(value.into());
        self
    }

    /// Appends a permission grant under `permissions`.
    ///
    /// Scopes are recorded exactly as given, wildcards included.
    #[must_use]
    pub fn with_grant(mut self, actions: &[&str], resources: &[&str]) -> Self {
        let grant = serde_json::json!({
            "effect": "Allow",
            "actions": actions,
            "resources": resources,
        });
        match self.0.get_mut("permissions") {
            Some(serde_json::Value::Array(grants)) => grants.push(grant),
            _ => {
                self.0
                    .insert("permissions".to_string(), serde_json::Value::Array(vec![grant]));
            }
        }
        self
    }

    /// Looks up a top-level entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns the number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the descriptor carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // Returns the entry under `key`, replacing any non-object value.
    fn object_entry(&mut self, key: &str) -> &mut serde_json::Value {
        let slot = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| serde_json::json!({}));
        if !slot.is_object() {
            *slot = serde_json::json!({});
        }
        slot
    }
}

/// A unit of work inside a stage.
///
/// Actions are plain data. Name uniqueness and artifact linkage are checked
/// by the owning stage and pipeline graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    name: String,
    #[serde(default = "default_rank")]
    rank: u32,
    #[serde(default)]
    inputs: BTreeSet<String>,
    #[serde(default)]
    outputs: BTreeSet<String>,
    #[serde(default)]
    resource: ResourceDescriptor,
}

fn default_rank() -> u32 {
    DEFAULT_RANK
}

impl Action {
    /// Creates an action with the default rank and no artifacts.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rank: DEFAULT_RANK,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            resource: ResourceDescriptor::new(),
        }
    }

    /// Sets the rank.
    #[must_use]
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }

    /// Adds an input artifact.
    #[must_use]
    pub fn with_input(mut self, artifact: impl Into<String>) -> Self {
        self.inputs.insert(artifact.into());
        self
    }

    /// Adds several input artifacts.
    #[must_use]
    pub fn with_inputs(mut self, artifacts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inputs.extend(artifacts.into_iter().map(Into::into));
        self
    }

    /// Adds an output artifact.
    #[must_use]
    pub fn with_output(mut self, artifact: impl Into<String>) -> Self {
        self.outputs.insert(artifact.into());
        self
    }

    /// Adds several output artifacts.
    #[must_use]
    pub fn with_outputs(mut self, artifacts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.outputs.extend(artifacts.into_iter().map(Into::into));
        self
    }

    /// Sets the resource descriptor.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceDescriptor) -> Self {
        self.resource = resource;
        self
    }

    /// Returns the action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rank.
    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Returns the input artifact names.
    #[must_use]
    pub fn inputs(&self) -> &BTreeSet<String> {
        &self.inputs
    }

    /// Returns the output artifact names.
    #[must_use]
    pub fn outputs(&self) -> &BTreeSet<String> {
        &self.outputs
    }

    /// Returns the resource descriptor.
    #[must_use]
    pub fn resource(&self) -> &ResourceDescriptor {
        &self.resource
    }
}

// Equality is by name: the owning stage is the scope.
impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Action {}
