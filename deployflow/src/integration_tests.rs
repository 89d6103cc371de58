//! End-to-end scenarios across graphs, units and hand-off.

use crate::blueprints::{model_deploy_composition_with_policy, PIPELINE_UNIT};
use crate::composition::Composition;
use crate::config::ComposerConfig;
use crate::core::Action;
use crate::errors::ComposerError;
use crate::events::CollectingEventSink;
use crate::pipeline::{GraphPolicy, PipelineBuilder};
use crate::testing::{
    assert_artifacts_flow_forward, assert_dependencies_precede, assert_unit_order,
    sample_environment, source_build_deploy, source_build_deploy_graph, RecordingExecutor,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const NONE: [&str; 0] = [];

#[test]
fn source_build_deploy_plan_on_the_wire() {
    let graph = source_build_deploy("delivery").build().unwrap();
    let plan = graph.linear_plan().unwrap();

    assert_eq!(
        serde_json::to_value(&plan).unwrap(),
        serde_json::json!([
            {"stageName": "Source", "batches": [["fetch"]]},
            {"stageName": "Build", "batches": [["compile"]]},
            {"stageName": "Deploy", "batches": [["publish"]]},
        ])
    );
    assert_artifacts_flow_forward(&graph, &plan);
}

#[test]
fn plans_are_byte_identical_across_calls_and_builds() {
    let mut graph = source_build_deploy_graph("delivery");
    graph.finalize().unwrap();
    let first = graph.linear_plan().unwrap();

    graph.finalize().unwrap();
    let again = graph.linear_plan().unwrap();
    let rebuilt = source_build_deploy("delivery").build().unwrap().linear_plan().unwrap();

    assert_eq!(first.to_json().unwrap(), again.to_json().unwrap());
    assert_eq!(first.fingerprint().unwrap(), rebuilt.fingerprint().unwrap());
}

#[test]
fn deploy_declared_before_build_fails_composition() {
    let graph = PipelineBuilder::new("delivery")
        .stage("Source", [Action::new("fetch").with_output("src")])
        .unwrap()
        .stage("Deploy", [Action::new("publish").with_input("bin")])
        .unwrap()
        .stage(
            "Build",
            [Action::new("compile").with_input("src").with_output("bin")],
        )
        .unwrap()
        .into_graph();

    let mut app = Composition::new("app");
    app.add_pipeline_unit("Pipeline", NONE, graph).unwrap();
    let err = app.compose().unwrap_err();

    assert_eq!(err.code(), "COMPOSE-003-ARTIFACT_ORDER");
    assert!(err.to_string().contains("Deploy/publish"));
    assert!(app.pipeline("Pipeline").is_some_and(|g| !g.is_finalized()));
}

#[test]
fn unproduced_artifact_is_rejected() {
    let err = PipelineBuilder::new("delivery")
        .stage("Build", [Action::new("compile").with_input("src")])
        .unwrap()
        .build()
        .unwrap_err();

    assert_eq!(err.code(), "COMPOSE-002-UNKNOWN_ARTIFACT");
}

#[test]
fn action_names_scoped_to_their_stage() {
    let same_stage =
        PipelineBuilder::new("p").stage("Build", [Action::new("build"), Action::new("build")]);
    assert!(matches!(
        same_stage.unwrap_err(),
        ComposerError::DuplicateAction { .. }
    ));

    let across_stages = PipelineBuilder::new("p")
        .stage("One", [Action::new("build")])
        .unwrap()
        .stage("Two", [Action::new("build")])
        .unwrap()
        .build();
    assert!(across_stages.is_ok());
}

#[test]
fn ranked_batches_inside_a_stage() {
    let graph = PipelineBuilder::new("p")
        .stage("Source", [Action::new("fetch").with_output("src")])
        .unwrap()
        .stage(
            "Build",
            [
                Action::new("package").with_rank(2).with_input("bin").with_output("pkg"),
                Action::new("compile").with_input("src").with_output("bin"),
                Action::new("lint").with_input("src"),
            ],
        )
        .unwrap()
        .stage("Deploy", [Action::new("publish").with_input("pkg")])
        .unwrap()
        .build()
        .unwrap();

    let plan = graph.linear_plan().unwrap();
    assert_eq!(
        plan.stages()[1].batches,
        vec![
            vec!["compile".to_string(), "lint".to_string()],
            vec!["package".to_string()],
        ]
    );
    assert_artifacts_flow_forward(&graph, &plan);
}

#[test]
fn mutual_unit_dependency_names_both_units() {
    let sink = Arc::new(CollectingEventSink::new());
    let mut app = Composition::new("app").with_event_sink(sink.clone());
    app.add_resource_unit("A", ["B"]).unwrap();
    app.add_resource_unit("B", ["A"]).unwrap();

    match app.compose().unwrap_err() {
        ComposerError::CyclicDependency { cycle } => {
            assert!(cycle.iter().any(|u| u == "A"));
            assert!(cycle.iter().any(|u| u == "B"));
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }

    let failed = sink.events_of_type("composition.failed");
    assert_eq!(failed.len(), 1);
    let data = failed[0].1.as_ref().unwrap();
    assert_eq!(data["error"]["code"], "COMPOSE-006-CYCLE");
}

#[test]
fn deployment_plan_on_the_wire() {
    let mut app = Composition::new("app");
    app.add_resource_unit("Role", NONE).unwrap();
    app.add_pipeline_unit("Pipeline", ["Role"], source_build_deploy_graph("delivery"))
        .unwrap();

    let value = serde_json::to_value(app.compose().unwrap()).unwrap();
    assert_eq!(
        value["units"][0],
        serde_json::json!({"name": "Role", "kind": "resource", "dependsOn": []})
    );
    assert_eq!(value["units"][1]["kind"], "pipeline");
    assert_eq!(value["units"][1]["dependsOn"], serde_json::json!(["Role"]));
    assert_eq!(value["units"][1]["plan"][2]["stageName"], "Deploy");
}

#[test]
fn blueprint_from_config_hands_off_in_order() {
    let json = serde_json::json!({
        "policy": {"unique_action_names": true},
        "environments": {"prod": sample_environment()},
    })
    .to_string();
    let config = ComposerConfig::from_json_str(&json).unwrap();
    let env = config.environment("prod").unwrap();

    let sink = Arc::new(CollectingEventSink::new());
    let mut app = model_deploy_composition_with_policy(env, config.policy)
        .unwrap()
        .with_event_sink(sink.clone());
    let mut executor = RecordingExecutor::new();
    let plan = app.hand_off(&mut executor).unwrap();

    assert_unit_order(
        &plan,
        &[
            "LambdaRecordModelName",
            "SageMakerRoleStack",
            "CiCdPipelineForSageMaker",
            "CdkModelDeployStack",
        ],
    );
    assert_dependencies_precede(&plan);
    assert_eq!(executor.provisioned_names(), plan.unit_names());
    assert_eq!(sink.events_of_type("unit.handed").len(), 4);

    let graph = app.pipeline(PIPELINE_UNIT).unwrap();
    let pipeline_plan = plan.unit(PIPELINE_UNIT).unwrap().plan.as_ref().unwrap();
    assert_eq!(pipeline_plan.len(), 4);
    assert_artifacts_flow_forward(graph, pipeline_plan);
}

#[test]
fn failed_hand_off_resumes_where_it_stopped() {
    let env = sample_environment();
    let mut app = model_deploy_composition_with_policy(&env, GraphPolicy::default()).unwrap();

    let mut flaky = RecordingExecutor::new().rejecting(PIPELINE_UNIT);
    let err = app.hand_off(&mut flaky).unwrap_err();
    assert_eq!(err.code(), "COMPOSE-016-HANDOFF");
    assert_eq!(flaky.provisioned_names(), vec!["LambdaRecordModelName", "SageMakerRoleStack"]);

    let mut retry = RecordingExecutor::new();
    app.hand_off(&mut retry).unwrap();
    assert_eq!(retry.provisioned_names(), vec![PIPELINE_UNIT, "CdkModelDeployStack"]);
}
