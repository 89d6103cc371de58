//! Deployable units and their provisioning order.

mod resolver;

pub use resolver::{DeployableUnit, UnitResolver};
