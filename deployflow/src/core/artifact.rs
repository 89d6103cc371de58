//! Artifact registry: single producer, many consumers.

use super::ActionId;
use crate::errors::{ComposerError, ComposerResult};
use serde::Serialize;
use std::collections::HashMap;

/// Linkage recorded for one named artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    /// The artifact name.
    pub name: String,
    /// The producing action, once declared.
    pub producer: Option<ActionId>,
    /// Consuming actions in registration order.
    pub consumers: Vec<ActionId>,
}

impl ArtifactRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            producer: None,
            consumers: Vec::new(),
        }
    }
}

/// Tracks which action produces and which actions consume each artifact.
///
/// Consumers may register before the producer does. Missing producers are
/// only reported by [`ArtifactRegistry::validate`].
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    records: Vec<ArtifactRecord>,
    index: HashMap<String, usize>,
}

impl ArtifactRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action` as the producer of `artifact`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateProducer` if the artifact already has a producer.
    pub fn declare_output(&mut self, action: &ActionId, artifact: &str) -> ComposerResult<()> {
        self.check_output(action, artifact)?;
        self.record_mut(artifact).producer = Some(action.clone());
        Ok(())
    }

    /// Registers `action` as a consumer of `artifact`.
    pub fn declare_input(&mut self, action: &ActionId, artifact: &str) {
        let record = self.record_mut(artifact);
        if !record.consumers.contains(action) {
            record.consumers.push(action.clone());
        }
    }

    /// Checks whether `action` could produce `artifact` without registering it.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateProducer` if another action already produces it.
    pub fn check_output(&self, action: &ActionId, artifact: &str) -> ComposerResult<()> {
        match self.producer_of(artifact) {
            Some(existing) => Err(ComposerError::DuplicateProducer {
                artifact: artifact.to_string(),
                producer: existing.to_string(),
                duplicate: action.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Returns the producer of `artifact`, if any.
    #[must_use]
    pub fn producer_of(&self, artifact: &str) -> Option<&ActionId> {
        self.record(artifact).and_then(|r| r.producer.as_ref())
    }

    /// Returns the consumers of `artifact`.
    #[must_use]
    pub fn consumers_of(&self, artifact: &str) -> &[ActionId] {
        self.record(artifact).map_or(&[], |r| r.consumers.as_slice())
    }

    /// Returns every artifact in first-mention order.
    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.records.iter()
    }

    /// Returns the number of distinct artifacts mentioned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no artifact has been mentioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks that every consumed artifact has a producer.
    ///
    /// # Errors
    ///
    /// Returns `UnknownArtifact` for the first consumed artifact, in
    /// first-mention order, that nobody produces.
    pub fn validate(&self) -> ComposerResult<()> {
        for record in &self.records {
            if record.producer.is_none() {
                if let Some(consumer) = record.consumers.first() {
                    return Err(ComposerError::UnknownArtifact {
                        artifact: record.name.clone(),
                        consumer: consumer.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn record(&self, artifact: &str) -> Option<&ArtifactRecord> {
        self.index.get(artifact).map(|&i| &self.records[i])
    }

    fn record_mut(&mut self, artifact: &str) -> &mut ArtifactRecord {
        let i = match self.index.get(artifact) {
            Some(&i) => i,
            None => {
                self.records.push(ArtifactRecord::new(artifact));
                let i = self.records.len() - 1;
                self.index.insert(artifact.to_string(), i);
                i
            }
        };
        &mut self.records[i]
    }
}
