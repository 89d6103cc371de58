//! Fluent pipeline builder with validation.

use super::{GraphPolicy, PipelineGraph, Stage};
use crate::core::Action;
use crate::errors::ComposerResult;

/// Builder for creating finalized pipeline graphs.
///
/// Each call validates eagerly, so the first inconsistency is reported at
/// the stage that introduced it.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    graph: PipelineGraph,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph: PipelineGraph::new(name),
        }
    }

    /// Sets the validation policy.
    #[must_use]
    pub fn policy(mut self, policy: GraphPolicy) -> Self {
        self.graph = self.graph.with_policy(policy);
        self
    }

    /// Appends a stage built from the given actions.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate action or stage names, a second producer
    /// for an artifact, or a malformed name.
    pub fn stage(
        mut self,
        name: impl Into<String>,
        actions: impl IntoIterator<Item = Action>,
    ) -> ComposerResult<Self> {
        let mut stage = Stage::new(name);
        for action in actions {
            stage.add_action(action)?;
        }
        self.graph.add_stage(stage)?;
        Ok(self)
    }

    /// Appends an already assembled stage.
    ///
    /// # Errors
    ///
    /// Same as [`PipelineGraph::add_stage`].
    pub fn add_stage(mut self, stage: Stage) -> ComposerResult<Self> {
        self.graph.add_stage(stage)?;
        Ok(self)
    }

    /// Appends every stage of `other` after the stages of this builder.
    ///
    /// The pipeline keeps this builder's name and policy.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateStage` if both builders hold a stage with the same
    /// name, or `DuplicateProducer` if both produce the same artifact.
    pub fn extend(mut self, other: Self) -> ComposerResult<Self> {
        for stage in other.graph.stages() {
            self.graph.add_stage(stage.clone())?;
        }
        Ok(self)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.graph.name()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.graph.stages().len()
    }

    /// Finalizes and returns the graph.
    ///
    /// # Errors
    ///
    /// Returns any error raised by [`PipelineGraph::finalize`].
    pub fn build(self) -> ComposerResult<PipelineGraph> {
        let mut graph = self.graph;
        graph.finalize()?;
        Ok(graph)
    }

    /// Returns the graph without finalizing it.
    #[must_use]
    pub fn into_graph(self) -> PipelineGraph {
        self.graph
    }
}
