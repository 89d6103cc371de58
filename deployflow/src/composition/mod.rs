//! Application-level composition of units and their pipelines.

mod composer;
mod plan;

pub use composer::{Composition, PlanExecutor};
pub use plan::{DeploymentPlan, PlannedUnit};
