// Copyright (c) 2025 - Cowboy AI, Inc.
//! Dependency Graph Assembly
//!
//! Units are registered without edges. Edges are then declared in one
//! assembly pass, either unit-to-unit or unit-to-group, and
//! [`CompositionBuilder::build`] validates the whole graph before handing
//! out a [`DeploymentPlan`].
//!
//! # Invariants
//!
//! 1. The dependency relation is acyclic. An edge that would close a cycle
//!    is rejected when it is declared.
//! 2. A unit may only embed another unit's tokens if it declares a direct
//!    edge to that unit (or to a group containing it).
//! 3. Members of a dependency group never depend on one another.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

use super::{DeploymentPlan, StackUnit};
use crate::domain::{LogicalId, NameError, StackName};

/// Composition-time error; always raised before any plan exists
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("Duplicate stack unit: {0}")]
    DuplicateUnit(StackName),

    #[error("Unknown stack unit: {0}")]
    UnknownUnit(String),

    #[error("Stack unit {0} cannot depend on itself")]
    SelfDependency(StackName),

    #[error("Dependency cycle: {}", format_path(.path))]
    Cycle { path: Vec<StackName> },

    #[error("{consumer} references {token} from {producer} without a declared dependency")]
    UndeclaredReference {
        consumer: StackName,
        producer: StackName,
        token: String,
    },

    #[error("{stack} references {token}, which names no declared resource")]
    DanglingToken { stack: StackName, token: String },

    #[error("Duplicate logical id {logical_id} in {stack}")]
    DuplicateLogicalId {
        stack: StackName,
        logical_id: LogicalId,
    },

    #[error("Duplicate output {key} in {stack}")]
    DuplicateOutput { stack: StackName, key: String },

    #[error("Duplicate parameter {name} in {stack}")]
    DuplicateParameter { stack: StackName, name: String },

    #[error("Duplicate dependency group: {0}")]
    DuplicateGroup(String),

    #[error("Dependency group {0} has no members")]
    EmptyGroup(String),

    #[error("Dependency group {group}: {dependent} depends on {dependency}")]
    GroupNotIndependent {
        group: String,
        dependent: StackName,
        dependency: StackName,
    },

    #[error("Invalid name: {0}")]
    Name(#[from] NameError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn format_path(path: &[StackName]) -> String {
    path.iter()
        .map(StackName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Unordered set of mutually independent units
///
/// A consumer of the group is satisfied once every member is applied,
/// whatever order the members were applied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    name: String,
    members: BTreeSet<StackName>,
}

impl DependencyGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &BTreeSet<StackName> {
        &self.members
    }

    pub fn contains(&self, unit: &StackName) -> bool {
        self.members.contains(unit)
    }
}

/// Two-phase graph assembly: register units, then declare edges
#[derive(Debug, Default)]
pub struct CompositionBuilder {
    units: BTreeMap<StackName, StackUnit>,
    dependencies: BTreeMap<StackName, BTreeSet<StackName>>,
    groups: BTreeMap<String, DependencyGroup>,
}

impl CompositionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, unit: StackUnit) -> Result<&mut Self, CompositionError> {
        let name = unit.name().clone();
        if self.units.contains_key(&name) {
            return Err(CompositionError::DuplicateUnit(name));
        }
        self.dependencies.insert(name.clone(), BTreeSet::new());
        self.units.insert(name, unit);
        Ok(self)
    }

    pub fn unit(&self, name: &StackName) -> Option<&StackUnit> {
        self.units.get(name)
    }

    fn require(&self, name: &StackName) -> Result<(), CompositionError> {
        if self.units.contains_key(name) {
            Ok(())
        } else {
            Err(CompositionError::UnknownUnit(name.to_string()))
        }
    }

    /// Dependency path `from -> ... -> to`, if `from` transitively depends on `to`
    fn dependency_path(&self, from: &StackName, to: &StackName) -> Option<Vec<StackName>> {
        let mut stack = vec![vec![from.clone()]];
        let mut visited = BTreeSet::new();
        while let Some(path) = stack.pop() {
            let current = path.last()?.clone();
            if &current == to {
                return Some(path);
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            for next in self.dependencies.get(&current).into_iter().flatten() {
                let mut extended = path.clone();
                extended.push(next.clone());
                stack.push(extended);
            }
        }
        None
    }

    /// Declare that `consumer` must be applied after `producer`
    pub fn depends_on(
        &mut self,
        consumer: &StackName,
        producer: &StackName,
    ) -> Result<&mut Self, CompositionError> {
        self.require(consumer)?;
        self.require(producer)?;
        if consumer == producer {
            return Err(CompositionError::SelfDependency(consumer.clone()));
        }
        if let Some(back) = self.dependency_path(producer, consumer) {
            let mut path = vec![consumer.clone()];
            path.extend(back);
            return Err(CompositionError::Cycle { path });
        }

        debug!(%consumer, %producer, "declared dependency");
        self.dependencies
            .entry(consumer.clone())
            .or_default()
            .insert(producer.clone());
        Ok(self)
    }

    /// Declare a group of units with no mutual dependency
    pub fn group(
        &mut self,
        name: impl Into<String>,
        members: &[&StackName],
    ) -> Result<DependencyGroup, CompositionError> {
        let name = name.into();
        if self.groups.contains_key(&name) {
            return Err(CompositionError::DuplicateGroup(name));
        }
        if members.is_empty() {
            return Err(CompositionError::EmptyGroup(name));
        }
        for member in members {
            self.require(member)?;
        }
        let group = DependencyGroup {
            name: name.clone(),
            members: members.iter().map(|m| (*m).clone()).collect(),
        };
        self.check_group_independent(&group)?;
        self.groups.insert(name, group.clone());
        Ok(group)
    }

    fn check_group_independent(&self, group: &DependencyGroup) -> Result<(), CompositionError> {
        for a in &group.members {
            for b in &group.members {
                if a != b && self.dependency_path(a, b).is_some() {
                    return Err(CompositionError::GroupNotIndependent {
                        group: group.name.clone(),
                        dependent: a.clone(),
                        dependency: b.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Declare that `consumer` must be applied after every member of `group`
    pub fn depends_on_group(
        &mut self,
        consumer: &StackName,
        group: &DependencyGroup,
    ) -> Result<&mut Self, CompositionError> {
        for member in &group.members {
            self.depends_on(consumer, member)?;
        }
        Ok(self)
    }

    /// Validate the graph and produce a deployable plan
    pub fn build(self) -> Result<DeploymentPlan, CompositionError> {
        for group in self.groups.values() {
            self.check_group_independent(group)?;
        }
        self.check_references()?;
        let stages = self.stages()?;

        debug!(units = self.units.len(), stages = stages.len(), "composition validated");
        Ok(DeploymentPlan::new(
            self.units,
            self.dependencies,
            self.groups,
            stages,
        ))
    }

    fn check_references(&self) -> Result<(), CompositionError> {
        for (name, unit) in &self.units {
            let declared = self.dependencies.get(name);
            for token in unit.tokens() {
                let owner = token.owner();
                let producer = self
                    .units
                    .get(owner)
                    .ok_or_else(|| CompositionError::UnknownUnit(owner.to_string()))?;

                if producer.resource(token.logical_id().as_str()).is_none() {
                    return Err(CompositionError::DanglingToken {
                        stack: name.clone(),
                        token: token.to_string(),
                    });
                }
                if owner != name && !declared.is_some_and(|deps| deps.contains(owner)) {
                    return Err(CompositionError::UndeclaredReference {
                        consumer: name.clone(),
                        producer: owner.clone(),
                        token: token.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Kahn layering; each stage depends only on earlier stages
    fn stages(&self) -> Result<Vec<Vec<StackName>>, CompositionError> {
        let mut remaining: BTreeMap<&StackName, BTreeSet<&StackName>> = self
            .dependencies
            .iter()
            .map(|(unit, deps)| (unit, deps.iter().collect()))
            .collect();
        let mut stages = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<StackName> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(unit, _)| (*unit).clone())
                .collect();

            if ready.is_empty() {
                let path: Vec<StackName> = remaining.keys().map(|n| (*n).clone()).collect();
                return Err(CompositionError::Cycle { path });
            }

            for unit in &ready {
                remaining.remove(unit);
            }
            for deps in remaining.values_mut() {
                for unit in &ready {
                    deps.remove(unit);
                }
            }
            stages.push(ready);
        }

        Ok(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;
    use serde_json::json;

    fn name(s: &str) -> StackName {
        StackName::new(s).unwrap()
    }

    fn builder(names: &[&str]) -> CompositionBuilder {
        let mut b = CompositionBuilder::new();
        for n in names {
            b.add_unit(StackUnit::new(name(n), *n)).unwrap();
        }
        b
    }

    #[test]
    fn test_linear_chain_stages() {
        let mut b = builder(&["net", "db", "job"]);
        b.depends_on(&name("db"), &name("net")).unwrap();
        b.depends_on(&name("job"), &name("db")).unwrap();
        let plan = b.build().unwrap();
        let order: Vec<&str> = plan.order().iter().map(|n| n.as_str()).collect();
        assert_eq!(order, vec!["net", "db", "job"]);
    }

    #[test]
    fn test_cycle_rejected_with_path() {
        let mut b = builder(&["a", "b", "c"]);
        b.depends_on(&name("b"), &name("a")).unwrap();
        b.depends_on(&name("c"), &name("b")).unwrap();
        let err = b.depends_on(&name("a"), &name("c")).unwrap_err();
        assert_eq!(err.to_string(), "Dependency cycle: a -> c -> b -> a");
    }

    #[test]
    fn test_self_and_unknown_edges_rejected() {
        let mut b = builder(&["a"]);
        assert_eq!(
            b.depends_on(&name("a"), &name("a")).unwrap_err(),
            CompositionError::SelfDependency(name("a"))
        );
        assert_eq!(
            b.depends_on(&name("a"), &name("zzz")).unwrap_err(),
            CompositionError::UnknownUnit("zzz".to_string())
        );
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let mut b = builder(&["a"]);
        assert!(matches!(
            b.add_unit(StackUnit::new(name("a"), "again")),
            Err(CompositionError::DuplicateUnit(_))
        ));
    }

    #[test]
    fn test_group_members_must_be_independent() {
        let mut b = builder(&["a", "b"]);
        b.depends_on(&name("b"), &name("a")).unwrap();
        assert!(matches!(
            b.group("data", &[&name("a"), &name("b")]),
            Err(CompositionError::GroupNotIndependent { .. })
        ));
        assert!(matches!(
            b.group("empty", &[]),
            Err(CompositionError::EmptyGroup(_))
        ));
    }

    #[test]
    fn test_group_broken_after_declaration_fails_build() {
        let mut b = builder(&["a", "b"]);
        b.group("data", &[&name("a"), &name("b")]).unwrap();
        b.depends_on(&name("b"), &name("a")).unwrap();
        assert!(matches!(
            b.build(),
            Err(CompositionError::GroupNotIndependent { .. })
        ));
    }

    #[test]
    fn test_undeclared_reference_rejected() {
        let mut producer = StackUnit::new(name("s3"), "storage");
        let bucket = producer
            .add_resource("AssetsBucket", ResourceType::Bucket, &json!({}))
            .unwrap();
        let mut consumer = StackUnit::new(name("job"), "job");
        consumer
            .add_resource(
                "Function",
                ResourceType::Function,
                &json!({"Environment": {"BUCKET_NAME": bucket.reference()}}),
            )
            .unwrap();

        let mut b = CompositionBuilder::new();
        b.add_unit(producer).unwrap();
        b.add_unit(consumer).unwrap();
        let err = b.build().unwrap_err();
        assert!(matches!(
            err,
            CompositionError::UndeclaredReference { ref consumer, ref producer, .. }
                if consumer.as_str() == "job" && producer.as_str() == "s3"
        ));
    }

    #[test]
    fn test_dangling_token_rejected() {
        let producer = StackUnit::new(name("s3"), "storage");
        let mut consumer = StackUnit::new(name("job"), "job");
        consumer
            .add_resource(
                "Function",
                ResourceType::Function,
                &json!({"Bucket": "${Token[s3/Missing]}"}),
            )
            .unwrap();

        let mut b = CompositionBuilder::new();
        b.add_unit(producer).unwrap();
        b.add_unit(consumer).unwrap();
        b.depends_on(&name("job"), &name("s3")).unwrap();
        assert!(matches!(
            b.build(),
            Err(CompositionError::DanglingToken { .. })
        ));
    }
}
