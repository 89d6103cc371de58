//! Pipeline composition.
//!
//! This module provides:
//! - Stages and their rank-ordered execution batches
//! - The pipeline graph with artifact validation
//! - A fluent builder
//! - The linear plan consumed by external executors

mod builder;
mod graph;
mod plan;
mod stage;

pub use builder::PipelineBuilder;
pub use graph::{GraphPolicy, PipelineGraph};
pub use plan::{LinearPlan, StagePlan};
pub use stage::Stage;
