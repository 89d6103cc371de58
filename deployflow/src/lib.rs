//! # Deployflow
//!
//! A static composer for staged build and deploy pipelines.
//!
//! Deployflow validates declared pipelines before anything runs:
//!
//! - **Artifact linkage**: every artifact has exactly one producer, and every
//!   consumer runs after it
//! - **Linear plans**: stages in order, actions batched by rank
//! - **Unit ordering**: independently provisioned units sorted so each
//!   follows its dependencies, with cycles reported by name
//! - **Hand-off**: units passed to an executor in provisioning order
//!
//! ## Quick Start
//!
//! ```rust
//! use deployflow::prelude::*;
//!
//! let graph = PipelineBuilder::new("delivery")
//!     .stage("Source", [Action::new("fetch").with_output("src")])?
//!     .stage("Build", [Action::new("compile").with_input("src").with_output("bin")])?
//!     .stage("Deploy", [Action::new("publish").with_input("bin")])?
//!     .build()?;
//!
//! let plan = graph.linear_plan()?;
//! assert_eq!(
//!     plan.to_json()?,
//!     r#"[{"stageName":"Source","batches":[["fetch"]]},{"stageName":"Build","batches":[["compile"]]},{"stageName":"Deploy","batches":[["publish"]]}]"#
//! );
//! # Ok::<(), ComposerError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod blueprints;
pub mod composition;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod units;

#[cfg(test)]
mod integration_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::blueprints::{
        model_deploy_composition, model_deploy_pipeline, model_training_pipeline,
    };
    pub use crate::composition::{Composition, DeploymentPlan, PlanExecutor, PlannedUnit};
    pub use crate::config::{ComposerConfig, PipelineEnvironment};
    pub use crate::core::{Action, ActionId, ResourceDescriptor, UnitKind, UnitState};
    pub use crate::errors::{ComposerError, ComposerResult, ContractErrorInfo};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{
        GraphPolicy, LinearPlan, PipelineBuilder, PipelineGraph, Stage, StagePlan,
    };
    pub use crate::units::{DeployableUnit, UnitResolver};
}
