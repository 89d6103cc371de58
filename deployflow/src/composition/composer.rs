//! The composer: orders units, finalizes their pipelines, hands them off.

use super::{DeploymentPlan, PlannedUnit};
use crate::core::{validate_name, UnitKind, UnitState};
use crate::errors::{ComposerError, ComposerResult};
use crate::events::{EventSink, NoOpEventSink};
use crate::observability::{CompositionSpanAttributes, SpanTimer};
use crate::pipeline::PipelineGraph;
use crate::units::UnitResolver;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Receives units in provisioning order.
///
/// Implemented by whatever actually provisions stacks and runs pipelines.
pub trait PlanExecutor {
    /// Provisions one unit. Every unit it depends on has already been
    /// accepted.
    fn provision(&mut self, unit: &PlannedUnit) -> anyhow::Result<()>;
}

/// A static application topology: units plus one graph per pipeline unit.
pub struct Composition {
    name: String,
    resolver: UnitResolver,
    pipelines: HashMap<String, PipelineGraph>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composition")
            .field("name", &self.name)
            .field("resolver", &self.resolver)
            .field("pipelines", &self.pipelines.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Composition {
    /// Creates an empty composition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolver: UnitResolver::new(),
            pipelines: HashMap::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Declares a plain resource unit.
    ///
    /// # Errors
    ///
    /// Same as [`UnitResolver::add_unit`].
    pub fn add_resource_unit(
        &mut self,
        name: impl Into<String>,
        depends_on: impl IntoIterator<Item = impl Into<String>>,
    ) -> ComposerResult<()> {
        self.resolver.add_unit(name, UnitKind::Resource, depends_on)
    }

    /// Declares a unit owning `graph`.
    ///
    /// # Errors
    ///
    /// Same as [`UnitResolver::add_unit`].
    pub fn add_pipeline_unit(
        &mut self,
        name: impl Into<String>,
        depends_on: impl IntoIterator<Item = impl Into<String>>,
        graph: PipelineGraph,
    ) -> ComposerResult<()> {
        let name = name.into();
        self.resolver.add_unit(name.clone(), UnitKind::Pipeline, depends_on)?;
        self.pipelines.insert(name, graph);
        Ok(())
    }

    /// Returns the composition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the graph owned by a pipeline unit.
    #[must_use]
    pub fn pipeline(&self, unit: &str) -> Option<&PipelineGraph> {
        self.pipelines.get(unit)
    }

    /// Returns a unit's lifecycle state.
    #[must_use]
    pub fn unit_state(&self, unit: &str) -> Option<UnitState> {
        self.resolver.state(unit)
    }

    /// Resolves unit order and finalizes every pipeline.
    ///
    /// Either every pipeline validates and a full plan is returned, or the
    /// first error is.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for a malformed composition name, resolver
    /// errors (`CyclicDependency`, `UnknownUnit`), or the first pipeline
    /// validation error.
    pub fn compose(&mut self) -> ComposerResult<DeploymentPlan> {
        let run_id = Uuid::now_v7().to_string();
        let timer = SpanTimer::start("compose");
        self.sink.emit(
            "composition.started",
            Some(serde_json::json!({ "app": &self.name, "run_id": &run_id })),
        );

        match self.build_plan() {
            Ok(plan) => {
                let pipelines = plan.units.iter().filter(|u| u.plan.is_some()).count();
                let attrs = CompositionSpanAttributes::new()
                    .with_app_name(&self.name)
                    .with_run_id(&run_id)
                    .with_counts(plan.units.len(), pipelines)
                    .with_duration_ms(timer.finish());
                info!(
                    app = %self.name,
                    run_id = %run_id,
                    units = plan.units.len(),
                    pipelines,
                    "Composition completed"
                );
                self.sink.emit(
                    "composition.completed",
                    Some(serde_json::json!(attrs.to_otel_attributes())),
                );
                Ok(plan)
            }
            Err(err) => {
                let attrs = CompositionSpanAttributes::new()
                    .with_app_name(&self.name)
                    .with_run_id(&run_id)
                    .with_error_code(err.code())
                    .with_duration_ms(timer.finish());
                error!(app = %self.name, run_id = %run_id, error = %err, "Composition failed");
                self.sink.emit(
                    "composition.failed",
                    Some(serde_json::json!({
                        "attributes": attrs.to_otel_attributes(),
                        "error": err.to_dict(),
                    })),
                );
                Err(err)
            }
        }
    }

    /// Composes, then passes each unit to `executor` in order.
    ///
    /// Stops at the first unit the executor rejects; units before it stay
    /// `Handed`, the rest stay `Ordered`.
    ///
    /// # Errors
    ///
    /// Returns any [`Composition::compose`] error, or `Handoff` naming the
    /// rejected unit.
    pub fn hand_off(&mut self, executor: &mut dyn PlanExecutor) -> ComposerResult<DeploymentPlan> {
        let plan = self.compose()?;

        for unit in &plan.units {
            if self.resolver.state(&unit.name) == Some(UnitState::Handed) {
                continue;
            }
            executor.provision(unit).map_err(|err| ComposerError::Handoff {
                unit: unit.name.clone(),
                reason: format!("{err:#}"),
            })?;
            self.resolver.mark_handed(&unit.name)?;
            self.sink
                .emit("unit.handed", Some(serde_json::json!({ "unit": &unit.name })));
        }

        Ok(plan)
    }

    fn build_plan(&mut self) -> ComposerResult<DeploymentPlan> {
        validate_name("composition", &self.name)?;
        let ordered: Vec<(String, UnitKind, Vec<String>)> = self
            .resolver
            .resolve_order()?
            .into_iter()
            .map(|u| (u.name.clone(), u.kind, u.depends_on.clone()))
            .collect();

        let mut units: Vec<PlannedUnit> = Vec::with_capacity(ordered.len());
        for (position, (name, kind, depends_on)) in ordered.into_iter().enumerate() {
            self.sink.emit(
                "unit.ordered",
                Some(serde_json::json!({ "unit": &name, "position": position })),
            );

            // The resolver yields dependencies first, so every dependency is
            // already planned when a pipeline's plan is attached here.
            debug_assert!(
                depends_on.iter().all(|dep| units.iter().any(|u| &u.name == dep)),
                "unit '{name}' ordered before one of its dependencies"
            );
            let plan = match (kind, self.pipelines.get_mut(&name)) {
                (UnitKind::Pipeline, Some(graph)) => {
                    graph.finalize()?;
                    let plan = graph.linear_plan()?;
                    self.sink.emit(
                        "graph.finalized",
                        Some(serde_json::json!({
                            "unit": &name,
                            "pipeline": graph.name(),
                            "stages": plan.len(),
                            "batches": plan.batch_count(),
                        })),
                    );
                    Some(plan)
                }
                _ => None,
            };

            units.push(PlannedUnit {
                name,
                kind,
                depends_on,
                plan,
            });
        }

        Ok(DeploymentPlan { units })
    }
}
