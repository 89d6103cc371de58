//! The deployment plan: ordered units with their pipeline plans.

use crate::core::UnitKind;
use crate::errors::ComposerResult;
use crate::pipeline::LinearPlan;
use serde::{Deserialize, Serialize};

/// One unit in provisioning order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedUnit {
    /// The unit name.
    pub name: String,
    /// Resource stack or pipeline stack.
    pub kind: UnitKind,
    /// Units provisioned before this one.
    pub depends_on: Vec<String>,
    /// The pipeline plan, for pipeline units.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub plan: Option<LinearPlan>,
}

/// Units in the order an executor must provision them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Ordered units.
    pub units: Vec<PlannedUnit>,
}

impl DeploymentPlan {
    /// Returns the unit names in order.
    #[must_use]
    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }

    /// Looks up a planned unit.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&PlannedUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Returns a unit's position in the order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.units.iter().position(|u| u.name == name)
    }

    /// Serializes the plan to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StagePlan;

    #[test]
    fn test_wire_format_skips_missing_plan() {
        let plan = DeploymentPlan {
            units: vec![
                PlannedUnit {
                    name: "Role".to_string(),
                    kind: UnitKind::Resource,
                    depends_on: vec![],
                    plan: None,
                },
                PlannedUnit {
                    name: "Pipeline".to_string(),
                    kind: UnitKind::Pipeline,
                    depends_on: vec!["Role".to_string()],
                    plan: Some(LinearPlan::new(vec![StagePlan::new(
                        "Source",
                        vec![vec!["fetch".to_string()]],
                    )])),
                },
            ],
        };

        let value = serde_json::to_value(&plan).unwrap();
        assert!(value["units"][0].get("plan").is_none());
        assert_eq!(value["units"][1]["dependsOn"], serde_json::json!(["Role"]));
        assert_eq!(value["units"][1]["plan"][0]["stageName"], "Source");
        assert_eq!(plan.position("Pipeline"), Some(1));
        assert_eq!(plan.unit_names(), vec!["Role", "Pipeline"]);

        let back: DeploymentPlan = serde_json::from_value(value).unwrap();
        assert_eq!(back, plan);
    }
}
