//! Mock executors for testing.

use crate::composition::{PlanExecutor, PlannedUnit};

/// An executor that records every unit it accepts.
///
/// Optionally rejects one unit by name.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    provisioned: Vec<PlannedUnit>,
    reject: Option<String>,
}

impl RecordingExecutor {
    /// Creates an executor accepting every unit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the named unit.
    #[must_use]
    pub fn rejecting(mut self, unit: impl Into<String>) -> Self {
        self.reject = Some(unit.into());
        self
    }

    /// Returns accepted unit names in hand-off order.
    #[must_use]
    pub fn provisioned_names(&self) -> Vec<&str> {
        self.provisioned.iter().map(|u| u.name.as_str()).collect()
    }

    /// Returns the accepted units.
    #[must_use]
    pub fn provisioned(&self) -> &[PlannedUnit] {
        &self.provisioned
    }
}

impl PlanExecutor for RecordingExecutor {
    fn provision(&mut self, unit: &PlannedUnit) -> anyhow::Result<()> {
        if self.reject.as_deref() == Some(unit.name.as_str()) {
            anyhow::bail!("stack {} failed to provision", unit.name);
        }
        self.provisioned.push(unit.clone());
        Ok(())
    }
}
