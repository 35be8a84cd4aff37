// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Plan
//!
//! The validated output of composition: every unit, its direct dependencies,
//! the declared groups and a deterministic staging. Units inside a stage have
//! no dependency on one another and may be applied in any order.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::{DependencyGroup, Parameter, StackUnit};
use crate::domain::{RemovalPolicy, StackName};

/// Validated, deployable composition
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    units: BTreeMap<StackName, StackUnit>,
    dependencies: BTreeMap<StackName, BTreeSet<StackName>>,
    groups: BTreeMap<String, DependencyGroup>,
    stages: Vec<Vec<StackName>>,
}

impl DeploymentPlan {
    pub(super) fn new(
        units: BTreeMap<StackName, StackUnit>,
        dependencies: BTreeMap<StackName, BTreeSet<StackName>>,
        groups: BTreeMap<String, DependencyGroup>,
        stages: Vec<Vec<StackName>>,
    ) -> Self {
        Self {
            units,
            dependencies,
            groups,
            stages,
        }
    }

    pub fn stages(&self) -> &[Vec<StackName>] {
        &self.stages
    }

    /// Flattened apply order
    pub fn order(&self) -> Vec<&StackName> {
        self.stages.iter().flatten().collect()
    }

    pub fn unit(&self, name: &StackName) -> Option<&StackUnit> {
        self.units.get(name)
    }

    pub fn units(&self) -> impl Iterator<Item = &StackUnit> {
        self.units.values()
    }

    pub fn group(&self, name: &str) -> Option<&DependencyGroup> {
        self.groups.get(name)
    }

    /// Direct dependencies of `name`
    pub fn dependencies_of(&self, name: &StackName) -> impl Iterator<Item = &StackName> {
        self.dependencies.get(name).into_iter().flatten()
    }

    /// Whether every direct dependency of `name` has been applied
    pub fn is_satisfied(&self, name: &StackName, applied: &BTreeSet<StackName>) -> bool {
        self.units.contains_key(name) && self.dependencies_of(name).all(|d| applied.contains(d))
    }

    /// Units not yet applied whose dependencies all are
    pub fn ready(&self, applied: &BTreeSet<StackName>) -> Vec<&StackName> {
        self.units
            .keys()
            .filter(|n| !applied.contains(*n) && self.is_satisfied(n, applied))
            .collect()
    }

    /// Every deploy-time parameter, as (unit, name, parameter)
    pub fn parameters(&self) -> impl Iterator<Item = (&StackName, &str, &Parameter)> {
        self.units.values().flat_map(|unit| {
            unit.parameters()
                .iter()
                .map(move |(name, p)| (unit.name(), name.as_str(), p))
        })
    }

    /// Serializable template for the provisioning engine
    pub fn to_document(&self) -> PlanDocument {
        let units = self
            .order()
            .into_iter()
            .filter_map(|name| self.units.get(name))
            .map(|unit| UnitDocument {
                name: unit.name().to_string(),
                description: unit.description().to_string(),
                depends_on: self
                    .dependencies_of(unit.name())
                    .map(|d| d.to_string())
                    .collect(),
                parameters: unit.parameters().clone(),
                resources: unit
                    .resources()
                    .iter()
                    .map(|r| {
                        (
                            r.logical_id().to_string(),
                            ResourceDocument {
                                kind: r.kind().engine_type(),
                                properties: r.properties().clone(),
                                deletion_policy: r.removal_policy(),
                            },
                        )
                    })
                    .collect(),
                outputs: unit
                    .outputs()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.value.clone()))
                    .collect(),
            })
            .collect();

        PlanDocument {
            stages: self
                .stages
                .iter()
                .map(|s| s.iter().map(|n| n.to_string()).collect())
                .collect(),
            groups: self
                .groups
                .values()
                .map(|g| {
                    (
                        g.name().to_string(),
                        g.members().iter().map(|m| m.to_string()).collect(),
                    )
                })
                .collect(),
            units,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_document())
    }
}

/// Plan as written to disk
#[derive(Debug, Clone, Serialize)]
pub struct PlanDocument {
    pub stages: Vec<Vec<String>>,
    pub groups: BTreeMap<String, Vec<String>>,
    pub units: Vec<UnitDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitDocument {
    pub name: String,
    pub description: String,
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    pub resources: BTreeMap<String, ResourceDocument>,
    pub outputs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDocument {
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
}
