//! Configuration for composed deployments.

use crate::errors::{ComposerError, ComposerResult};
use crate::pipeline::GraphPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Environment variable consulted when `account` is blank.
pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
/// Environment variable consulted when `region` is blank.
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

/// Identifiers one deployment environment feeds into a pipeline.
///
/// All identifiers are opaque and passed through into resource descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEnvironment {
    /// Id of the source-control connection.
    pub connection_id: String,
    /// Role the model build assumes.
    pub role_identifier: String,
    /// Function notified with the produced model name.
    pub downstream_function_identifier: String,
    /// Target account.
    #[serde(default)]
    pub account: String,
    /// Target region.
    #[serde(default)]
    pub region: String,
    /// Source repository owner.
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Source repository name.
    #[serde(default = "default_repo")]
    pub repo: String,
    /// Source branch.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Name of the delivery pipeline.
    #[serde(default = "default_pipeline_name")]
    pub pipeline_name: String,
}

fn default_owner() -> String {
    "cdk-entest".to_string()
}

fn default_repo() -> String {
    "sagemaker-pipeline".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_pipeline_name() -> String {
    "CiCdPipelineForSageMaker".to_string()
}

impl PipelineEnvironment {
    /// Creates an environment with default repository settings.
    #[must_use]
    pub fn new(
        connection_id: impl Into<String>,
        role_identifier: impl Into<String>,
        downstream_function_identifier: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            role_identifier: role_identifier.into(),
            downstream_function_identifier: downstream_function_identifier.into(),
            account: String::new(),
            region: String::new(),
            owner: default_owner(),
            repo: default_repo(),
            branch: default_branch(),
            pipeline_name: default_pipeline_name(),
        }
    }

    /// Sets account and region.
    #[must_use]
    pub fn with_target(mut self, account: impl Into<String>, region: impl Into<String>) -> Self {
        self.account = account.into();
        self.region = region.into();
        self
    }

    /// Sets the source repository.
    #[must_use]
    pub fn with_repository(
        mut self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        self.owner = owner.into();
        self.repo = repo.into();
        self.branch = branch.into();
        self
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = name.into();
        self
    }

    /// Fills blank account and region from the given values.
    pub fn apply_overrides(&mut self, account: Option<&str>, region: Option<&str>) {
        if let (true, Some(account)) = (self.account.trim().is_empty(), account) {
            self.account = account.to_string();
        }
        if let (true, Some(region)) = (self.region.trim().is_empty(), region) {
            self.region = region.to_string();
        }
    }

    /// ARN of the source-control connection.
    #[must_use]
    pub fn connection_arn(&self) -> String {
        format!(
            "arn:aws:codestar-connections:{}:{}:connection/{}",
            self.region, self.account, self.connection_id
        )
    }
}

/// Top-level composer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Validation policy applied to every pipeline graph.
    #[serde(default)]
    pub policy: GraphPolicy,
    /// Named deployment environments.
    #[serde(default)]
    pub environments: BTreeMap<String, PipelineEnvironment>,
}

impl ComposerConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named environment.
    #[must_use]
    pub fn with_environment(mut self, name: impl Into<String>, env: PipelineEnvironment) -> Self {
        self.environments.insert(name.into(), env);
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Config` when the document does not match the schema.
    pub fn from_json_str(json: &str) -> ComposerResult<Self> {
        serde_json::from_str(json).map_err(|e| ComposerError::Config(e.to_string()))
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, or `Config` if it cannot be
    /// parsed.
    pub fn from_file(path: impl AsRef<Path>) -> ComposerResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading composer config");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Fills blank accounts and regions from `CDK_DEFAULT_ACCOUNT` and
    /// `CDK_DEFAULT_REGION`.
    pub fn apply_env_overrides(&mut self) {
        let account = std::env::var(ACCOUNT_ENV).ok();
        let region = std::env::var(REGION_ENV).ok();
        for env in self.environments.values_mut() {
            env.apply_overrides(account.as_deref(), region.as_deref());
        }
    }

    /// Looks up a named environment.
    ///
    /// # Errors
    ///
    /// Returns `Config` if no environment has that name.
    pub fn environment(&self, name: &str) -> ComposerResult<&PipelineEnvironment> {
        self.environments.get(name).ok_or_else(|| {
            ComposerError::Config(format!(
                "unknown environment '{name}' (known: {})",
                self.environments.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "environments": {
            "dev": {
                "connection_id": "conn-1",
                "role_identifier": "arn:aws:iam::111:role/DataScientist",
                "downstream_function_identifier": "arn:aws:lambda:us-east-1:111:function:record"
            }
        }
    }"#;

    #[test]
    fn test_defaults_applied() {
        let config = ComposerConfig::from_json_str(MINIMAL).unwrap();
        let dev = config.environment("dev").unwrap();

        assert!(!config.policy.unique_action_names);
        assert_eq!(dev.branch, "main");
        assert_eq!(dev.repo, "sagemaker-pipeline");
        assert_eq!(dev.pipeline_name, "CiCdPipelineForSageMaker");
        assert_eq!(dev.account, "");
    }

    #[test]
    fn test_policy_parsed() {
        let config =
            ComposerConfig::from_json_str(r#"{"policy": {"unique_action_names": true}}"#).unwrap();
        assert!(config.policy.unique_action_names);
        assert!(config.environments.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let err = ComposerConfig::from_json_str(r#"{"environments": {"dev": {}}}"#).unwrap_err();
        assert_eq!(err.code(), "COMPOSE-017-CONFIG");
    }

    #[test]
    fn test_unknown_environment() {
        let config = ComposerConfig::from_json_str(MINIMAL).unwrap();
        let err = config.environment("prod").unwrap_err();
        assert!(err.to_string().contains("dev"));
    }

    #[test]
    fn test_overrides_fill_only_blanks() {
        let mut env = PipelineEnvironment::new("c", "r", "f").with_target("", "eu-west-1");
        env.apply_overrides(Some("222"), Some("us-east-1"));

        assert_eq!(env.account, "222");
        assert_eq!(env.region, "eu-west-1");
    }

    #[test]
    fn test_connection_arn() {
        let env = PipelineEnvironment::new("abc-123", "r", "f").with_target("111", "ap-southeast-1");
        assert_eq!(
            env.connection_arn(),
            "arn:aws:codestar-connections:ap-southeast-1:111:connection/abc-123"
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = ComposerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.environments.len(), 1);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ComposerConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ComposerError::Io(_)));
    }
}
