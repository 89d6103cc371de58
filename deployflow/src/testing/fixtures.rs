//! Test fixtures for pipeline and composition tests.

use crate::config::PipelineEnvironment;
use crate::core::Action;
use crate::pipeline::{PipelineBuilder, PipelineGraph};

/// Three stages linked by artifacts: `Source -> Build -> Deploy`.
///
/// `fetch` produces `src`, `compile` turns `src` into `bin`, `publish`
/// consumes `bin`.
///
/// # Panics
///
/// Panics if the builder rejects the fixture.
#[must_use]
pub fn source_build_deploy(name: &str) -> PipelineBuilder {
    let builder = PipelineBuilder::new(name)
        .stage("Source", [Action::new("fetch").with_output("src")])
        .and_then(|b| {
            b.stage(
                "Build",
                [Action::new("compile").with_input("src").with_output("bin")],
            )
        })
        .and_then(|b| b.stage("Deploy", [Action::new("publish").with_input("bin")]));

    match builder {
        Ok(builder) => builder,
        Err(err) => panic!("fixture pipeline rejected: {err}"),
    }
}

/// [`source_build_deploy`] as an unfinalized graph.
#[must_use]
pub fn source_build_deploy_graph(name: &str) -> PipelineGraph {
    source_build_deploy(name).into_graph()
}

/// An environment with every identifier filled in.
#[must_use]
pub fn sample_environment() -> PipelineEnvironment {
    PipelineEnvironment::new(
        "531f066b-0e71-4549-90c9-97b036303ec0",
        "arn:aws:iam::123456789012:role/RoleForDataScientistUserProfile",
        "arn:aws:lambda:ap-southeast-1:123456789012:function:RecordModelName",
    )
    .with_target("123456789012", "ap-southeast-1")
}
