//! Test assertions for deployment and pipeline plans.

use crate::composition::DeploymentPlan;
use crate::core::ActionId;
use crate::pipeline::{LinearPlan, PipelineGraph};

/// Asserts the plan lists exactly these units in this order.
pub fn assert_unit_order(plan: &DeploymentPlan, expected: &[&str]) {
    assert_eq!(
        plan.unit_names(),
        expected,
        "Unexpected unit order"
    );
}

/// Asserts every unit appears after all of its dependencies.
pub fn assert_dependencies_precede(plan: &DeploymentPlan) {
    for (position, unit) in plan.units.iter().enumerate() {
        for dep in &unit.depends_on {
            let dep_position = plan.position(dep);
            assert!(
                dep_position.is_some_and(|p| p < position),
                "Unit '{}' at {} does not follow dependency '{}' (at {:?})",
                unit.name,
                position,
                dep,
                dep_position
            );
        }
    }
}

/// Asserts every artifact is produced in an earlier batch than any of its
/// consumers, where batches are ordered by stage then by position within
/// the stage.
pub fn assert_artifacts_flow_forward(graph: &PipelineGraph, plan: &LinearPlan) {
    for record in graph.registry().artifacts() {
        let producer = record
            .producer
            .as_ref()
            .unwrap_or_else(|| panic!("Artifact '{}' has no producer", record.name));
        let produced_at = batch_of(plan, producer);
        for consumer in &record.consumers {
            let consumed_at = batch_of(plan, consumer);
            assert!(
                produced_at < consumed_at,
                "Artifact '{}' produced by {} at {:?} but consumed by {} at {:?}",
                record.name,
                producer,
                produced_at,
                consumer,
                consumed_at
            );
        }
    }
}

fn batch_of(plan: &LinearPlan, id: &ActionId) -> (usize, usize) {
    plan.stages()
        .iter()
        .enumerate()
        .find(|(_, stage)| stage.stage_name == id.stage)
        .and_then(|(s, stage)| {
            stage
                .batches
                .iter()
                .position(|batch| batch.iter().any(|a| *a == id.action))
                .map(|b| (s, b))
        })
        .unwrap_or_else(|| panic!("Action {id} missing from plan"))
}
