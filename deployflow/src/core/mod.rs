//! Core domain model types for deployflow.
//!
//! This module contains the fundamental types used throughout the composer:
//! - Actions, their ids and opaque resource descriptors
//! - The artifact registry linking producers to consumers
//! - Unit kind and lifecycle enums
//! - Identifier validation

mod action;
mod artifact;
mod names;
mod status;

pub use action::{Action, ActionId, ResourceDescriptor, DEFAULT_RANK};
pub use artifact::{ArtifactRecord, ArtifactRegistry};
pub use names::{is_valid_name, validate_name};
pub use status::{UnitKind, UnitState};
