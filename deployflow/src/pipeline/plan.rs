//! The linear plan handed to an external executor.

use crate::errors::ComposerResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One stage of a linear plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePlan {
    /// The stage name.
    pub stage_name: String,
    /// Action names grouped into sequential batches.
    pub batches: Vec<Vec<String>>,
}

impl StagePlan {
    /// Creates a stage plan.
    #[must_use]
    pub fn new(stage_name: impl Into<String>, batches: Vec<Vec<String>>) -> Self {
        Self {
            stage_name: stage_name.into(),
            batches,
        }
    }

    /// Returns the number of actions across all batches.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

/// Ordered stages, each expanded into its execution batches.
///
/// Stages run strictly in sequence. Inside a stage, batch `n + 1` starts only
/// after every action of batch `n` has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearPlan {
    stages: Vec<StagePlan>,
}

impl LinearPlan {
    /// Creates a plan from stage plans.
    #[must_use]
    pub fn new(stages: Vec<StagePlan>) -> Self {
        Self { stages }
    }

    /// Returns the stage plans in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StagePlan] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the plan holds no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the total number of batches.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.stages.iter().map(|s| s.batches.len()).sum()
    }

    /// Serializes the plan to compact JSON.
    pub fn to_json(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the plan to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 of the compact JSON form, hex encoded.
    ///
    /// Two plans with the same fingerprint are byte-identical.
    pub fn fingerprint(&self) -> ComposerResult<String> {
        let json = self.to_json()?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}
