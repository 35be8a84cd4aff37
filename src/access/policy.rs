// Copyright (c) 2025 - Cowboy AI, Inc.
//! Execution Roles and Policy Grants
//!
//! A role is an identity assumed by one service principal, plus an
//! enumerable set of grants. Grants are additive, scoped to named
//! resources, and individually revocable.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::LogicalId;

/// Policy validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Grant has no actions")]
    EmptyActions,

    #[error("Grant has no resources")]
    EmptyResources,

    #[error("Wildcard resource for {actions:?} requires an explicit broad grant")]
    WildcardNotAllowed { actions: Vec<String> },

    #[error("Grant for {grant} cannot be attached to role {role}")]
    PrincipalMismatch { grant: String, role: String },
}

/// Identity a grant is issued to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    /// A role declared in the same unit as the grant holder
    Role(LogicalId),
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(id) => write!(f, "role:{id}"),
        }
    }
}

/// Stable identifier of a grant, used for revocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrantId(Uuid);

impl GrantId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const WILDCARD: &str = "*";

/// Allow-statement: an action set over a resource scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    id: GrantId,
    principal: Principal,
    actions: Vec<String>,
    resources: Vec<String>,
    broad_reason: Option<String>,
}

impl Grant {
    /// Grant scoped to named resources; a bare `*` is rejected
    pub fn scoped<A, R>(principal: Principal, actions: A, resources: R) -> Result<Self, PolicyError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let actions: Vec<String> = actions.into_iter().map(Into::into).collect();
        let resources: Vec<String> = resources.into_iter().map(Into::into).collect();
        if actions.is_empty() {
            return Err(PolicyError::EmptyActions);
        }
        if resources.is_empty() {
            return Err(PolicyError::EmptyResources);
        }
        if resources.iter().any(|r| r == WILDCARD) {
            return Err(PolicyError::WildcardNotAllowed { actions });
        }
        Ok(Self {
            id: GrantId::new(),
            principal,
            actions,
            resources,
            broad_reason: None,
        })
    }

    /// Grant over every resource; only for actions that cannot be scoped
    pub fn broad<A>(principal: Principal, actions: A, reason: impl Into<String>) -> Result<Self, PolicyError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let actions: Vec<String> = actions.into_iter().map(Into::into).collect();
        if actions.is_empty() {
            return Err(PolicyError::EmptyActions);
        }
        Ok(Self {
            id: GrantId::new(),
            principal,
            actions,
            resources: vec![WILDCARD.to_string()],
            broad_reason: Some(reason.into()),
        })
    }

    pub fn id(&self) -> GrantId {
        self.id
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn is_broad(&self) -> bool {
        self.broad_reason.is_some()
    }

    pub fn broad_reason(&self) -> Option<&str> {
        self.broad_reason.as_deref()
    }
}

impl Serialize for Grant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Statement", 3)?;
        s.serialize_field("Effect", "Allow")?;
        s.serialize_field("Action", &self.actions)?;
        s.serialize_field("Resource", &self.resources)?;
        s.end()
    }
}

/// Identity assumed by a service, with its managed policies and grants
#[derive(Debug, Clone)]
pub struct ExecutionRole {
    logical_id: LogicalId,
    assumed_by: String,
    description: String,
    managed_policies: Vec<String>,
    grants: BTreeMap<GrantId, Grant>,
}

impl ExecutionRole {
    pub fn new(
        logical_id: LogicalId,
        assumed_by: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            logical_id,
            assumed_by: assumed_by.into(),
            description: description.into(),
            managed_policies: Vec::new(),
            grants: BTreeMap::new(),
        }
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn principal(&self) -> Principal {
        Principal::Role(self.logical_id.clone())
    }

    pub fn assumed_by(&self) -> &str {
        &self.assumed_by
    }

    pub fn add_managed_policy(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.managed_policies.contains(&name) {
            self.managed_policies.push(name);
        }
    }

    pub fn managed_policies(&self) -> &[String] {
        &self.managed_policies
    }

    /// Attach a grant issued to this role
    pub fn attach(&mut self, grant: Grant) -> Result<GrantId, PolicyError> {
        if grant.principal != self.principal() {
            return Err(PolicyError::PrincipalMismatch {
                grant: grant.principal.to_string(),
                role: self.principal().to_string(),
            });
        }
        let id = grant.id;
        self.grants.insert(id, grant);
        Ok(id)
    }

    /// Remove one grant; other grants are untouched
    pub fn revoke(&mut self, id: GrantId) -> Option<Grant> {
        self.grants.remove(&id)
    }

    pub fn grants(&self) -> impl Iterator<Item = &Grant> {
        self.grants.values()
    }

    pub fn grant(&self, id: GrantId) -> Option<&Grant> {
        self.grants.get(&id)
    }

    /// Whether some grant allows `action` on exactly `resource` (or `*`)
    pub fn allows(&self, action: &str, resource: &str) -> bool {
        self.grants.values().any(|g| {
            g.actions.iter().any(|a| a == action)
                && g.resources.iter().any(|r| r == resource || r == WILDCARD)
        })
    }
}

impl Serialize for ExecutionRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut statements: Vec<&Grant> = self.grants.values().collect();
        statements.sort_by(|a, b| (&a.actions, &a.resources).cmp(&(&b.actions, &b.resources)));
        let managed: Vec<String> = self
            .managed_policies
            .iter()
            .map(|p| format!("arn:aws:iam::aws:policy/{p}"))
            .collect();

        let mut s = serializer.serialize_struct("Role", 4)?;
        s.serialize_field(
            "AssumeRolePolicyDocument",
            &serde_json::json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": self.assumed_by },
                    "Action": "sts:AssumeRole",
                }],
            }),
        )?;
        s.serialize_field("Description", &self.description)?;
        s.serialize_field("ManagedPolicyArns", &managed)?;
        s.serialize_field(
            "Policies",
            &serde_json::json!([{
                "PolicyName": format!("{}DefaultPolicy", self.logical_id),
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": statements,
                },
            }]),
        )?;
        s.end()
    }
}
