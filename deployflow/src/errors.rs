//! Error types for the deployflow composer.
//!
//! Every failure is raised at composition or validation time. Each variant
//! carries a stable contract code so callers can react to a failure without
//! matching on message text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type ComposerResult<T> = Result<T, ComposerError>;

/// The main error type for composition and validation.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// An artifact was declared as output by a second action.
    #[error("Artifact '{artifact}' is already produced by '{producer}' (duplicate producer '{duplicate}')")]
    DuplicateProducer {
        /// The artifact name.
        artifact: String,
        /// The action already registered as producer.
        producer: String,
        /// The action that attempted to produce it again.
        duplicate: String,
    },

    /// An action consumes an artifact nobody produces.
    #[error("Action '{consumer}' consumes unknown artifact '{artifact}'")]
    UnknownArtifact {
        /// The artifact name.
        artifact: String,
        /// The consuming action.
        consumer: String,
    },

    /// An artifact is consumed before it is produced.
    #[error("Artifact '{artifact}' is consumed by '{consumer}' before its producer '{producer}' runs")]
    ArtifactOrderingViolation {
        /// The artifact name.
        artifact: String,
        /// The producing action.
        producer: String,
        /// The consuming action.
        consumer: String,
    },

    /// Two actions share a name within the same scope.
    #[error("Duplicate action '{action}' in {scope}")]
    DuplicateAction {
        /// The action name.
        action: String,
        /// Where the collision happened (a stage or the whole pipeline).
        scope: String,
    },

    /// Two stages share a name within a pipeline.
    #[error("Duplicate stage '{stage}' in pipeline '{pipeline}'")]
    DuplicateStage {
        /// The stage name.
        stage: String,
        /// The pipeline name.
        pipeline: String,
    },

    /// The unit dependency graph is not a DAG.
    #[error("Cyclic unit dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// The cycle path; the first name is repeated at the end.
        cycle: Vec<String>,
    },

    /// A stage has no actions.
    #[error("Stage '{stage}' has no actions")]
    EmptyStage {
        /// The stage name.
        stage: String,
    },

    /// A pipeline has no stages.
    #[error("Pipeline '{pipeline}' has no stages")]
    EmptyPipeline {
        /// The pipeline name.
        pipeline: String,
    },

    /// A name does not match the accepted identifier pattern.
    #[error("Invalid {kind} name '{name}'")]
    InvalidName {
        /// What was being named ("stage", "action", "unit", ...).
        kind: &'static str,
        /// The rejected name.
        name: String,
    },

    /// Two units share a name.
    #[error("Duplicate unit '{unit}'")]
    DuplicateUnit {
        /// The unit name.
        unit: String,
    },

    /// A unit depends on a unit that was never declared.
    #[error("Unit '{unit}' depends on unknown unit '{dependency}'")]
    UnknownUnit {
        /// The declaring unit.
        unit: String,
        /// The missing dependency.
        dependency: String,
    },

    /// A unit name was looked up but never declared.
    #[error("Unit '{unit}' is not declared")]
    UnitNotFound {
        /// The unit name.
        unit: String,
    },

    /// Units can no longer be declared once ordering has happened.
    #[error("Cannot declare unit '{unit}': unit order has already been resolved")]
    ResolverSealed {
        /// The rejected unit.
        unit: String,
    },

    /// A unit lifecycle transition is not allowed.
    #[error("Unit '{unit}' cannot move from {from} to {to}")]
    InvalidTransition {
        /// The unit name.
        unit: String,
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// `linear_plan` was requested before a successful `finalize`.
    #[error("Pipeline '{pipeline}' has not been finalized")]
    NotFinalized {
        /// The pipeline name.
        pipeline: String,
    },

    /// The external executor rejected a unit.
    #[error("Hand-off of unit '{unit}' failed: {reason}")]
    Handoff {
        /// The unit name.
        unit: String,
        /// The executor's error chain.
        reason: String,
    },

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ComposerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl ComposerError {
    /// Returns the stable contract code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateProducer { .. } => "COMPOSE-001-DUP_PRODUCER",
            Self::UnknownArtifact { .. } => "COMPOSE-002-UNKNOWN_ARTIFACT",
            Self::ArtifactOrderingViolation { .. } => "COMPOSE-003-ARTIFACT_ORDER",
            Self::DuplicateAction { .. } => "COMPOSE-004-DUP_ACTION",
            Self::DuplicateStage { .. } => "COMPOSE-005-DUP_STAGE",
            Self::CyclicDependency { .. } => "COMPOSE-006-CYCLE",
            Self::EmptyStage { .. } => "COMPOSE-007-EMPTY_STAGE",
            Self::EmptyPipeline { .. } => "COMPOSE-008-EMPTY",
            Self::InvalidName { .. } => "COMPOSE-009-NAME",
            Self::DuplicateUnit { .. } => "COMPOSE-010-DUP_UNIT",
            Self::UnknownUnit { .. } => "COMPOSE-011-MISSING_UNIT",
            Self::UnitNotFound { .. } => "COMPOSE-012-NO_UNIT",
            Self::ResolverSealed { .. } => "COMPOSE-013-SEALED",
            Self::InvalidTransition { .. } => "COMPOSE-014-TRANSITION",
            Self::NotFinalized { .. } => "COMPOSE-015-NOT_FINALIZED",
            Self::Handoff { .. } => "COMPOSE-016-HANDOFF",
            Self::Config(_) => "COMPOSE-017-CONFIG",
            Self::Serialization(_) => "COMPOSE-018-SERDE",
            Self::Io(_) => "COMPOSE-019-IO",
        }
    }

    /// Builds diagnostic metadata for this error.
    #[must_use]
    pub fn error_info(&self) -> ContractErrorInfo {
        let mut info = ContractErrorInfo::new(self.code(), self.to_string());
        if let Some(hint) = ContractSuggestions::get(self.code()) {
            info = info.with_fix_hint(hint);
        }

        match self {
            Self::DuplicateProducer { artifact, producer, duplicate } => info
                .with_context_entry("artifact", artifact)
                .with_context_entry("producer", producer)
                .with_context_entry("duplicate", duplicate),
            Self::UnknownArtifact { artifact, consumer } => info
                .with_context_entry("artifact", artifact)
                .with_context_entry("consumer", consumer),
            Self::ArtifactOrderingViolation { artifact, producer, consumer } => info
                .with_context_entry("artifact", artifact)
                .with_context_entry("producer", producer)
                .with_context_entry("consumer", consumer),
            Self::CyclicDependency { cycle } => {
                info.with_context_entry("cycle", cycle.join(" -> "))
            }
            Self::UnknownUnit { unit, dependency } => info
                .with_context_entry("unit", unit)
                .with_context_entry("dependency", dependency),
            _ => info,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map.insert("code".to_string(), serde_json::json!(self.code()));
        let info: serde_json::Map<String, serde_json::Value> =
            self.error_info().to_dict().into_iter().collect();
        map.insert("error_info".to_string(), serde_json::Value::Object(info));
        map
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "COMPOSE-006-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::Value::String(self.code.clone()));
        map.insert("summary".to_string(), serde_json::Value::String(self.summary.clone()));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::Value::String(hint.clone()));
        }
        if !self.context.is_empty() {
            let context_map: serde_json::Map<String, serde_json::Value> = self
                .context
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("context".to_string(), serde_json::Value::Object(context_map));
        }

        map
    }
}

/// Provides default suggestions for common contract error codes.
pub struct ContractSuggestions;

impl ContractSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "COMPOSE-001-DUP_PRODUCER" => Some(
                "Each artifact has exactly one producer. Rename one of the outputs.",
            ),
            "COMPOSE-002-UNKNOWN_ARTIFACT" => Some(
                "Declare an action that outputs the artifact, or check the input name for typos.",
            ),
            "COMPOSE-003-ARTIFACT_ORDER" => Some(
                "Move the producing stage before the consumer, or give the producer a lower rank \
                 inside the same stage.",
            ),
            "COMPOSE-004-DUP_ACTION" => Some("Rename one of the actions."),
            "COMPOSE-005-DUP_STAGE" => Some("Stage names must be unique within a pipeline."),
            "COMPOSE-006-CYCLE" => Some(
                "Remove one of the unit dependencies in the cycle to break it.",
            ),
            "COMPOSE-007-EMPTY_STAGE" => Some("Add at least one action to the stage."),
            "COMPOSE-008-EMPTY" => Some(
                "Add at least one stage to the pipeline before finalizing.",
            ),
            "COMPOSE-011-MISSING_UNIT" => Some(
                "Declare the dependency as a unit, or check the name for typos.",
            ),
            _ => None,
        }
    }
}
