//! Testing utilities for composed deployments.
//!
//! This module provides:
//! - Reusable pipeline and environment fixtures
//! - Recording executors for hand-off tests
//! - Assertions over plan ordering

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_artifacts_flow_forward, assert_dependencies_precede, assert_unit_order};
pub use fixtures::{sample_environment, source_build_deploy, source_build_deploy_graph};
pub use mocks::RecordingExecutor;
