//! Topological ordering of deployable units.

use crate::core::{validate_name, UnitKind, UnitState};
use crate::errors::{ComposerError, ComposerResult};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A named, independently provisioned component.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployableUnit {
    /// The unit name.
    pub name: String,
    /// Resource stack or pipeline stack.
    pub kind: UnitKind,
    /// Names of units that must be provisioned first, in declaration order.
    pub depends_on: Vec<String>,
    /// Lifecycle state.
    pub state: UnitState,
}

/// One-shot resolver producing a provisioning order for units.
///
/// Units are declared once; after a successful [`UnitResolver::resolve_order`]
/// the set is sealed and only lifecycle transitions remain.
#[derive(Debug, Clone, Default)]
pub struct UnitResolver {
    units: Vec<DeployableUnit>,
    index: HashMap<String, usize>,
    order: Option<Vec<usize>>,
}

impl UnitResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a unit.
    ///
    /// Dependencies may name units declared later.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateUnit`, `InvalidName`, or `ResolverSealed` once the
    /// order has been resolved.
    pub fn add_unit(
        &mut self,
        name: impl Into<String>,
        kind: UnitKind,
        depends_on: impl IntoIterator<Item = impl Into<String>>,
    ) -> ComposerResult<()> {
        let name = name.into();
        if self.order.is_some() {
            return Err(ComposerError::ResolverSealed { unit: name });
        }
        validate_name("unit", &name)?;
        if self.index.contains_key(&name) {
            return Err(ComposerError::DuplicateUnit { unit: name });
        }

        let mut deps: Vec<String> = Vec::new();
        for dep in depends_on {
            let dep = dep.into();
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }

        debug!(unit = %name, %kind, depends_on = ?deps, "Unit declared");
        self.index.insert(name.clone(), self.units.len());
        self.units.push(DeployableUnit {
            name,
            kind,
            depends_on: deps,
            state: UnitState::Declared,
        });
        Ok(())
    }

    /// Orders units so every unit follows its dependencies.
    ///
    /// Independent units keep their declaration order. Repeated calls return
    /// the same order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit` for a dependency that was never declared, or
    /// `CyclicDependency` naming the members of a cycle.
    pub fn resolve_order(&mut self) -> ComposerResult<Vec<&DeployableUnit>> {
        if self.order.is_none() {
            let order = self.compute_order()?;
            for &i in &order {
                self.units[i].state = UnitState::Ordered;
            }
            self.order = Some(order);
        }
        Ok(self.ordered_units())
    }

    /// Moves an ordered unit to `Handed`.
    ///
    /// # Errors
    ///
    /// Returns `UnitNotFound` for an undeclared name, or `InvalidTransition`
    /// unless the unit is currently `Ordered`.
    pub fn mark_handed(&mut self, name: &str) -> ComposerResult<()> {
        let Some(&i) = self.index.get(name) else {
            return Err(ComposerError::UnitNotFound {
                unit: name.to_string(),
            });
        };
        let unit = &mut self.units[i];
        if !unit.state.can_transition_to(UnitState::Handed) {
            return Err(ComposerError::InvalidTransition {
                unit: unit.name.clone(),
                from: unit.state.to_string(),
                to: UnitState::Handed.to_string(),
            });
        }
        unit.state = UnitState::Handed;
        Ok(())
    }

    /// Returns the units in declaration order.
    #[must_use]
    pub fn units(&self) -> &[DeployableUnit] {
        &self.units
    }

    /// Looks up a unit by name.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&DeployableUnit> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    /// Returns the lifecycle state of a unit.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<UnitState> {
        self.unit(name).map(|u| u.state)
    }

    /// Returns true once an order has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.order.is_some()
    }

    fn ordered_units(&self) -> Vec<&DeployableUnit> {
        self.order
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|&i| &self.units[i])
            .collect()
    }

    fn compute_order(&self) -> ComposerResult<Vec<usize>> {
        let deps = self.dependency_indices()?;
        let mut placed = vec![false; self.units.len()];
        let mut order = Vec::with_capacity(self.units.len());

        // Always take the earliest-declared ready unit so ties resolve by
        // declaration order.
        while let Some(next) = (0..self.units.len())
            .find(|&i| !placed[i] && deps[i].iter().all(|&d| placed[d]))
        {
            placed[next] = true;
            order.push(next);
        }

        if order.len() < self.units.len() {
            let cycle = self.find_cycle(&deps, &placed);
            warn!(cycle = ?cycle, "Cyclic unit dependency");
            return Err(ComposerError::CyclicDependency { cycle });
        }

        Ok(order)
    }

    fn dependency_indices(&self) -> ComposerResult<Vec<Vec<usize>>> {
        self.units
            .iter()
            .map(|unit| {
                unit.depends_on
                    .iter()
                    .map(|dep| {
                        self.index.get(dep).copied().ok_or_else(|| ComposerError::UnknownUnit {
                            unit: unit.name.clone(),
                            dependency: dep.clone(),
                        })
                    })
                    .collect::<ComposerResult<Vec<usize>>>()
            })
            .collect()
    }

    /// Walks unplaced dependencies from the first stuck unit until a node
    /// repeats. Every unplaced unit has an unplaced dependency, so the walk
    /// always closes a cycle.
    fn find_cycle(&self, deps: &[Vec<usize>], placed: &[bool]) -> Vec<String> {
        let mut path: Vec<usize> = Vec::new();
        let mut current = placed.iter().position(|&p| !p);

        while let Some(node) = current {
            if let Some(start) = path.iter().position(|&n| n == node) {
                let mut cycle: Vec<String> =
                    path[start..].iter().map(|&i| self.units[i].name.clone()).collect();
                cycle.push(self.units[node].name.clone());
                return cycle;
            }
            path.push(node);
            current = deps[node].iter().copied().find(|&d| !placed[d]);
        }

        path.into_iter().map(|i| self.units[i].name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NONE: [&str; 0] = [];

    fn names(units: &[&DeployableUnit]) -> Vec<String> {
        units.iter().map(|u| u.name.clone()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("Pipeline", UnitKind::Pipeline, ["Role", "Function"]).unwrap();
        resolver.add_unit("Role", UnitKind::Resource, NONE).unwrap();
        resolver.add_unit("Function", UnitKind::Resource, NONE).unwrap();

        let order = names(&resolver.resolve_order().unwrap());
        assert_eq!(order, vec!["Role", "Function", "Pipeline"]);
    }

    #[test]
    fn test_ties_broken_by_declaration_order() {
        let mut resolver = UnitResolver::new();
        for name in ["C", "A", "B"] {
            resolver.add_unit(name, UnitKind::Resource, NONE).unwrap();
        }
        assert_eq!(names(&resolver.resolve_order().unwrap()), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_two_unit_cycle() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("A", UnitKind::Resource, ["B"]).unwrap();
        resolver.add_unit("B", UnitKind::Resource, ["A"]).unwrap();

        match resolver.resolve_order() {
            Err(ComposerError::CyclicDependency { cycle }) => {
                assert!(cycle.contains(&"A".to_string()));
                assert!(cycle.contains(&"B".to_string()));
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
        assert_eq!(resolver.state("A"), Some(UnitState::Declared));
    }

    #[test]
    fn test_cycle_reported_without_bystanders() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("Top", UnitKind::Resource, ["X"]).unwrap();
        resolver.add_unit("X", UnitKind::Resource, ["Y"]).unwrap();
        resolver.add_unit("Y", UnitKind::Resource, ["Z"]).unwrap();
        resolver.add_unit("Z", UnitKind::Resource, ["X"]).unwrap();

        let err = resolver.resolve_order().unwrap_err();
        match err {
            ComposerError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["X", "Y", "Z", "X"]);
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("Loop", UnitKind::Resource, ["Loop"]).unwrap();
        assert!(matches!(
            resolver.resolve_order().unwrap_err(),
            ComposerError::CyclicDependency { .. }
        ));
    }

    #[test]
    fn test_unknown_dependency() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("Pipeline", UnitKind::Pipeline, ["Missing"]).unwrap();
        assert!(matches!(
            resolver.resolve_order().unwrap_err(),
            ComposerError::UnknownUnit { .. }
        ));
    }

    #[test]
    fn test_duplicate_unit() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("Role", UnitKind::Resource, NONE).unwrap();
        assert!(matches!(
            resolver.add_unit("Role", UnitKind::Resource, NONE).unwrap_err(),
            ComposerError::DuplicateUnit { .. }
        ));
    }

    #[test]
    fn test_lifecycle() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("Role", UnitKind::Resource, NONE).unwrap();
        assert_eq!(resolver.state("Role"), Some(UnitState::Declared));
        assert!(resolver.mark_handed("Role").is_err());

        resolver.resolve_order().unwrap();
        assert_eq!(resolver.state("Role"), Some(UnitState::Ordered));

        resolver.mark_handed("Role").unwrap();
        assert_eq!(resolver.state("Role"), Some(UnitState::Handed));
        assert!(matches!(
            resolver.mark_handed("Role").unwrap_err(),
            ComposerError::InvalidTransition { .. }
        ));
    }

    #[test]
    fn test_sealed_after_resolution() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("Role", UnitKind::Resource, NONE).unwrap();
        let first = names(&resolver.resolve_order().unwrap());
        let second = names(&resolver.resolve_order().unwrap());
        assert_eq!(first, second);

        assert!(matches!(
            resolver.add_unit("Late", UnitKind::Resource, NONE).unwrap_err(),
            ComposerError::ResolverSealed { .. }
        ));
    }

    #[test]
    fn test_duplicate_dependencies_collapsed() {
        let mut resolver = UnitResolver::new();
        resolver.add_unit("Role", UnitKind::Resource, NONE).unwrap();
        resolver.add_unit("Pipeline", UnitKind::Pipeline, ["Role", "Role"]).unwrap();
        assert_eq!(resolver.unit("Pipeline").unwrap().depends_on, vec!["Role"]);
    }
}
