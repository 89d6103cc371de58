//! Ready-made compositions.
//!
//! The model-deploy blueprint wires a source checkout, two build
//! stages and an endpoint deployment into one pipeline, plus the
//! stacks the pipeline needs provisioned first.
//!
//! The model-training blueprint is the workflow the model build stage
//! runs: process data, train, create the model, record its name.

use crate::composition::Composition;
use crate::config::PipelineEnvironment;
use crate::core::{Action, ResourceDescriptor};
use crate::errors::ComposerResult;
use crate::pipeline::{GraphPolicy, PipelineBuilder, PipelineGraph};

/// Function stack recording produced model names.
pub const RECORD_MODEL_NAME_UNIT: &str = "LambdaRecordModelName";
/// Role stack assumed by the model build.
pub const SAGEMAKER_ROLE_UNIT: &str = "SageMakerRoleStack";
/// The delivery pipeline stack.
pub const PIPELINE_UNIT: &str = "CiCdPipelineForSageMaker";
/// Endpoint stack deployed by the pipeline's last stage.
pub const ENDPOINT_UNIT: &str = "CdkModelDeployStack";

/// Name of the model-training workflow.
pub const MODEL_TRAINING_PIPELINE: &str = "AbalonePipeline";

const SOURCE_OUTPUT: &str = "SourceOutput";
const CDK_BUILD_OUTPUT: &str = "CdkBuildOutput";
const SAGEMAKER_BUILD_OUTPUT: &str = "SageMakerBuildOutput";

const TRAIN_DATA: &str = "TrainData";
const VALIDATION_DATA: &str = "ValidationData";
const TEST_DATA: &str = "TestData";
const MODEL_ARTIFACTS: &str = "ModelArtifacts";
const MODEL_NAME: &str = "ModelName";

const TRAINING_INSTANCE_TYPE: &str = "ml.m5.xlarge";

const MODEL_BUILD_GRANTS: &[&str] = &[
    "sagemaker:*",
    "s3:*",
    "lambda:*",
    "iam:GetRole",
    "iam:PassRole",
    "states:*",
    "logs:*",
];

fn codebuild_project(name: &str) -> ResourceDescriptor {
    ResourceDescriptor::new()
        .with("type", serde_json::json!("codebuild"))
        .with("projectName", serde_json::json!(name))
        .with("privileged", serde_json::json!(true))
        .with("buildImage", serde_json::json!("STANDARD_5_0"))
        .with("computeType", serde_json::json!("MEDIUM"))
}

/// Builds the four-stage model delivery pipeline for `env`.
///
/// The graph is returned unfinalized; a malformed `env.pipeline_name` is
/// reported by [`PipelineGraph::finalize`].
///
/// # Errors
///
/// Propagates stage construction errors.
pub fn model_deploy_pipeline(env: &PipelineEnvironment) -> ComposerResult<PipelineGraph> {
    model_deploy_pipeline_with_policy(env, GraphPolicy::default())
}

/// Like [`model_deploy_pipeline`], validated under `policy`.
///
/// # Errors
///
/// Propagates stage construction errors.
pub fn model_deploy_pipeline_with_policy(
    env: &PipelineEnvironment,
    policy: GraphPolicy,
) -> ComposerResult<PipelineGraph> {
    let checkout = Action::new("Github").with_output(SOURCE_OUTPUT).with_resource(
        ResourceDescriptor::new()
            .with("type", serde_json::json!("codestar-connection-source"))
            .with("owner", serde_json::json!(env.owner))
            .with("repo", serde_json::json!(env.repo))
            .with("branch", serde_json::json!(env.branch))
            .with("connectionArn", serde_json::json!(env.connection_arn())),
    );

    let synth = Action::new("BuildSagemakerEndpointStack")
        .with_input(SOURCE_OUTPUT)
        .with_output(CDK_BUILD_OUTPUT)
        .with_resource(
            codebuild_project("CdkBuildSageMakerEndpoint")
                .with_phase_commands("install", &["cd cdk-model-deploy", "npm install"])
                .with_phase_commands("build", &["npm run build", "npm run cdk synth -- -o dist"])
                .with(
                    "artifacts",
                    serde_json::json!({
                        "base-directory": "cdk-model-deploy/dist",
                        "files": ["*.template.json"],
                    }),
                ),
        );

    let train = Action::new("BuildSageMakerModel")
        .with_input(SOURCE_OUTPUT)
        .with_output(SAGEMAKER_BUILD_OUTPUT)
        .with_resource(
            codebuild_project("BuildSageMakerModel")
                .with_env_var("SAGEMAKER_ROLE", env.role_identifier.as_str())
                .with_env_var("LAMBDA_ARN", env.downstream_function_identifier.as_str())
                .with_phase_commands("install", &["pip install -r requirements.txt"])
                .with_phase_commands("build", &["python sagemaker_pipeline.py"])
                .with_grant(MODEL_BUILD_GRANTS, &["*"]),
        );

    let deploy = Action::new("DeploySageMakerEndpoint")
        .with_input(CDK_BUILD_OUTPUT)
        .with_resource(
            ResourceDescriptor::new()
                .with("type", serde_json::json!("cloudformation-create-update"))
                .with("stackName", serde_json::json!(ENDPOINT_UNIT))
                .with(
                    "templatePath",
                    serde_json::json!(format!("{CDK_BUILD_OUTPUT}::{ENDPOINT_UNIT}.template.json")),
                )
                .with("adminPermissions", serde_json::json!(true)),
        );

    Ok(PipelineBuilder::new(env.pipeline_name.as_str())
        .policy(policy)
        .stage("SourceStage", [checkout])?
        .stage("BuildCdkStage", [synth])?
        .stage("BuildSageMakerModel", [train])?
        .stage("DeploySageMakerModel", [deploy])?
        .into_graph())
}

fn xgboost_image(env: &PipelineEnvironment) -> serde_json::Value {
    serde_json::json!({
        "framework": "xgboost",
        "version": "1.0-1",
        "pyVersion": "py3",
        "region": env.region,
        "instanceType": TRAINING_INSTANCE_TYPE,
    })
}

/// Builds the model-training workflow run by the model build stage.
///
/// `Process` splits the raw dataset, `Train` fits the model from the train
/// and validation splits, `CreateModel` registers the trained artifacts and
/// `RecordModelName` hands the model name to the downstream function.
/// The graph is returned unfinalized.
///
/// # Errors
///
/// Propagates stage construction errors.
pub fn model_training_pipeline(env: &PipelineEnvironment) -> ComposerResult<PipelineGraph> {
    let process = Action::new("AbaloneProcess")
        .with_outputs([TRAIN_DATA, VALIDATION_DATA, TEST_DATA])
        .with_resource(
            ResourceDescriptor::new()
                .with("type", serde_json::json!("processing"))
                .with("framework", serde_json::json!({"name": "sklearn", "version": "0.23-1"}))
                .with("instanceType", serde_json::json!(TRAINING_INSTANCE_TYPE))
                .with("instanceCount", serde_json::json!(1))
                .with("role", serde_json::json!(env.role_identifier))
                .with("code", serde_json::json!("preprocessing.py")),
        );

    let train = Action::new("AbaloneTrain")
        .with_inputs([TRAIN_DATA, VALIDATION_DATA])
        .with_output(MODEL_ARTIFACTS)
        .with_resource(
            ResourceDescriptor::new()
                .with("type", serde_json::json!("training"))
                .with("image", xgboost_image(env))
                .with("instanceType", serde_json::json!(TRAINING_INSTANCE_TYPE))
                .with("instanceCount", serde_json::json!(1))
                .with("role", serde_json::json!(env.role_identifier))
                .with("contentType", serde_json::json!("text/csv"))
                .with(
                    "hyperparameters",
                    serde_json::json!({
                        "objective": "reg:linear",
                        "num_round": 50,
                        "max_depth": 5,
                        "eta": 0.2,
                        "gamma": 4,
                        "min_child_weight": 6,
                        "subsample": 0.7,
                    }),
                ),
        );

    let create_model = Action::new("AbaloneCreateModel")
        .with_input(MODEL_ARTIFACTS)
        .with_output(MODEL_NAME)
        .with_resource(
            ResourceDescriptor::new()
                .with("type", serde_json::json!("create-model"))
                .with("image", xgboost_image(env))
                .with("instanceType", serde_json::json!("ml.m5.large"))
                .with("acceleratorType", serde_json::json!("ml.eia1.medium"))
                .with("role", serde_json::json!(env.role_identifier)),
        );

    let record = Action::new("LambdaRecordModelNameToParameterStore")
        .with_input(MODEL_NAME)
        .with_resource(
            ResourceDescriptor::new()
                .with("type", serde_json::json!("lambda"))
                .with("functionArn", serde_json::json!(env.downstream_function_identifier)),
        );

    Ok(PipelineBuilder::new(MODEL_TRAINING_PIPELINE)
        .stage("Process", [process])?
        .stage("Train", [train])?
        .stage("CreateModel", [create_model])?
        .stage("RecordModelName", [record])?
        .into_graph())
}

/// Declares the full model-deploy application.
///
/// # Errors
///
/// Propagates pipeline construction errors.
pub fn model_deploy_composition(env: &PipelineEnvironment) -> ComposerResult<Composition> {
    model_deploy_composition_with_policy(env, GraphPolicy::default())
}

/// Like [`model_deploy_composition`], validated under `policy`.
///
/// # Errors
///
/// Propagates pipeline construction errors.
pub fn model_deploy_composition_with_policy(
    env: &PipelineEnvironment,
    policy: GraphPolicy,
) -> ComposerResult<Composition> {
    let none: [&str; 0] = [];
    let mut app = Composition::new(env.pipeline_name.as_str());
    app.add_resource_unit(RECORD_MODEL_NAME_UNIT, none)?;
    app.add_resource_unit(SAGEMAKER_ROLE_UNIT, none)?;
    app.add_pipeline_unit(
        PIPELINE_UNIT,
        [RECORD_MODEL_NAME_UNIT, SAGEMAKER_ROLE_UNIT],
        model_deploy_pipeline_with_policy(env, policy)?,
    )?;
    app.add_resource_unit(ENDPOINT_UNIT, none)?;
    Ok(app)
}
