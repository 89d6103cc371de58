//! Pipeline graph: ordered stages plus artifact linkage.

use super::{LinearPlan, Stage, StagePlan};
use crate::core::{validate_name, ActionId, ArtifactRegistry};
use crate::errors::{ComposerError, ComposerResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Validation switches for a pipeline graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPolicy {
    /// Require action names to be unique across the whole pipeline rather
    /// than only within their stage.
    #[serde(default)]
    pub unique_action_names: bool,
}

impl GraphPolicy {
    /// Policy requiring globally unique action names.
    #[must_use]
    pub fn globally_unique() -> Self {
        Self {
            unique_action_names: true,
        }
    }
}

/// A totally ordered sequence of stages sharing one artifact registry.
#[derive(Debug, Clone)]
pub struct PipelineGraph {
    name: String,
    stages: Vec<Stage>,
    positions: HashMap<String, usize>,
    registry: ArtifactRegistry,
    policy: GraphPolicy,
    finalized: bool,
}

impl PipelineGraph {
    /// Creates an empty graph with the default policy.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            positions: HashMap::new(),
            registry: ArtifactRegistry::new(),
            policy: GraphPolicy::default(),
            finalized: false,
        }
    }

    /// Sets the validation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: GraphPolicy) -> Self {
        self.policy = policy;
        self.finalized = false;
        self
    }

    /// Appends a stage and registers its artifacts.
    ///
    /// Nothing is changed when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateStage` on a name collision, `DuplicateProducer` if one
    /// of the stage's outputs already has a producer, or `InvalidName`.
    pub fn add_stage(&mut self, stage: Stage) -> ComposerResult<()> {
        validate_name("stage", stage.name())?;
        if self.positions.contains_key(stage.name()) {
            return Err(ComposerError::DuplicateStage {
                stage: stage.name().to_string(),
                pipeline: self.name.clone(),
            });
        }

        // Check every output before touching the registry.
        let mut staged: HashMap<&str, ActionId> = HashMap::new();
        for action in stage.actions() {
            let id = ActionId::new(stage.name(), action.name());
            for artifact in action.outputs() {
                if let Some(existing) = staged.get(artifact.as_str()) {
                    return Err(ComposerError::DuplicateProducer {
                        artifact: artifact.clone(),
                        producer: existing.to_string(),
                        duplicate: id.to_string(),
                    });
                }
                validate_name("artifact", artifact)?;
                self.registry.check_output(&id, artifact)?;
                staged.insert(artifact.as_str(), id.clone());
            }
            for artifact in action.inputs() {
                validate_name("artifact", artifact)?;
            }
        }

        for action in stage.actions() {
            let id = ActionId::new(stage.name(), action.name());
            for artifact in action.outputs() {
                self.registry.declare_output(&id, artifact)?;
            }
            for artifact in action.inputs() {
                self.registry.declare_input(&id, artifact);
            }
        }

        debug!(
            pipeline = %self.name,
            stage = %stage.name(),
            position = self.stages.len(),
            actions = stage.actions().len(),
            "Stage added"
        );

        self.positions.insert(stage.name().to_string(), self.stages.len());
        self.stages.push(stage);
        self.finalized = false;
        Ok(())
    }

    /// Appends a stage, builder style.
    ///
    /// # Errors
    ///
    /// Same as [`PipelineGraph::add_stage`].
    pub fn with_stage(mut self, stage: Stage) -> ComposerResult<Self> {
        self.add_stage(stage)?;
        Ok(self)
    }

    /// Validates the graph.
    ///
    /// Calling it again without a structural change is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for a malformed pipeline name, `EmptyPipeline`,
    /// `EmptyStage`, `UnknownArtifact`, `ArtifactOrderingViolation`, or
    /// `DuplicateAction` when the policy requires globally unique action
    /// names.
    pub fn finalize(&mut self) -> ComposerResult<()> {
        if self.finalized {
            return Ok(());
        }

        validate_name("pipeline", &self.name)?;

        if self.stages.is_empty() {
            return Err(ComposerError::EmptyPipeline {
                pipeline: self.name.clone(),
            });
        }
        if let Some(stage) = self.stages.iter().find(|s| s.is_empty()) {
            return Err(ComposerError::EmptyStage {
                stage: stage.name().to_string(),
            });
        }

        self.registry.validate()?;
        self.check_artifact_order()?;
        if self.policy.unique_action_names {
            self.check_global_action_names()?;
        }

        self.finalized = true;
        info!(
            pipeline = %self.name,
            stages = self.stages.len(),
            artifacts = self.registry.len(),
            "Pipeline finalized"
        );
        Ok(())
    }

    /// Returns the validated plan.
    ///
    /// # Errors
    ///
    /// Returns `NotFinalized` unless [`PipelineGraph::finalize`] succeeded
    /// after the last structural change.
    pub fn linear_plan(&self) -> ComposerResult<LinearPlan> {
        if !self.finalized {
            return Err(ComposerError::NotFinalized {
                pipeline: self.name.clone(),
            });
        }

        let stages = self
            .stages
            .iter()
            .map(|stage| {
                let batches = stage
                    .execution_batches()
                    .into_iter()
                    .map(|batch| batch.iter().map(|a| a.name().to_string()).collect())
                    .collect();
                StagePlan::new(stage.name(), batches)
            })
            .collect();

        Ok(LinearPlan::new(stages))
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stage_position(name).map(|i| &self.stages[i])
    }

    /// Returns a stage's position in the sequence.
    #[must_use]
    pub fn stage_position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Returns the artifact registry.
    #[must_use]
    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    /// Returns the validation policy.
    #[must_use]
    pub fn policy(&self) -> GraphPolicy {
        self.policy
    }

    /// Returns true after a successful [`PipelineGraph::finalize`].
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Returns the stage position and rank of an action.
    fn locate(&self, id: &ActionId) -> Option<(usize, u32)> {
        let position = self.stage_position(&id.stage)?;
        let rank = self.stages[position].action(&id.action)?.rank();
        Some((position, rank))
    }

    fn check_artifact_order(&self) -> ComposerResult<()> {
        for record in self.registry.artifacts() {
            let Some(producer) = record.producer.as_ref() else {
                continue;
            };
            let Some(produced_at) = self.locate(producer) else {
                continue;
            };

            for consumer in &record.consumers {
                let Some(consumed_at) = self.locate(consumer) else {
                    continue;
                };
                // Same stage: the producer's batch must finish first.
                if consumed_at <= produced_at {
                    return Err(ComposerError::ArtifactOrderingViolation {
                        artifact: record.name.clone(),
                        producer: producer.to_string(),
                        consumer: consumer.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_global_action_names(&self) -> ComposerResult<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for stage in &self.stages {
            for action in stage.actions() {
                if seen.insert(action.name(), stage.name()).is_some() {
                    return Err(ComposerError::DuplicateAction {
                        action: action.name().to_string(),
                        scope: format!("pipeline '{}'", self.name),
                    });
                }
            }
        }
        Ok(())
    }
}
