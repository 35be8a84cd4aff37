// Copyright (c) 2025 - Cowboy AI, Inc.
//! Secret Handles and Parameter Pointers
//!
//! A [`SecretHandle`] is the only way a stack unit refers to stored
//! database credentials. It exposes the secret's identity and a way to issue
//! read grants, never the credential material. Exactly one unit creates a
//! handle (the unit that owns the database); everyone else receives a grant,
//! or a [`ParameterPointer`] naming the secret when they live in another
//! deployment unit.

use serde::Serialize;

use super::{Grant, PolicyError, Principal};
use crate::composition::{CompositionError, ResourceRef, StackUnit, Token};
use crate::domain::{ResourceType, StackName};

/// Actions a secret reader needs
pub const SECRET_READ_ACTIONS: [&str; 2] = [
    "secretsmanager:GetSecretValue",
    "secretsmanager:DescribeSecret",
];

/// Actions a parameter reader needs
pub const PARAMETER_READ_ACTIONS: [&str; 4] = [
    "ssm:DescribeParameters",
    "ssm:GetParameters",
    "ssm:GetParameter",
    "ssm:GetParameterHistory",
];

/// Deploy-time identity of a stored secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretIdentity {
    arn: Token,
    name: Token,
}

impl SecretIdentity {
    /// ARN-equivalent identity
    pub fn arn(&self) -> &Token {
        &self.arn
    }

    pub fn name(&self) -> &Token {
        &self.name
    }
}

/// Capability over a stored credential: identity and read grants only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretHandle {
    identity: SecretIdentity,
}

impl SecretHandle {
    /// Only the owning stack creates a handle, from its secret resource
    pub(crate) fn for_secret(secret: &ResourceRef) -> Self {
        Self {
            identity: SecretIdentity {
                arn: secret.reference(),
                name: secret.attr("Name"),
            },
        }
    }

    pub fn identity(&self) -> &SecretIdentity {
        &self.identity
    }

    /// Unit that owns the secret's lifecycle
    pub fn owner(&self) -> &StackName {
        self.identity.arn.owner()
    }

    /// Read-only grant scoped to this one secret
    pub fn grant_read(&self, principal: &Principal) -> Result<Grant, PolicyError> {
        Grant::scoped(
            principal.clone(),
            SECRET_READ_ACTIONS,
            [self.identity.arn.to_string()],
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterProperties<'a> {
    name: &'a str,
    #[serde(rename = "Type")]
    kind: &'static str,
    value: String,
    description: &'static str,
}

/// Named parameter whose value is a secret's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPointer {
    name: String,
    resource: ResourceRef,
}

impl ParameterPointer {
    /// Declare the parameter in `unit`, pointing at `secret`
    pub fn declare(
        unit: &mut StackUnit,
        logical_id: &str,
        name: impl Into<String>,
        secret: &SecretHandle,
    ) -> Result<Self, CompositionError> {
        let name = name.into();
        let resource = unit.add_resource(
            logical_id,
            ResourceType::Parameter,
            &ParameterProperties {
                name: &name,
                kind: "String",
                value: secret.identity().arn().to_string(),
                description: "ARN of the database credentials secret",
            },
        )?;
        Ok(Self { name, resource })
    }

    /// Parameter name consumers look up
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arn(&self) -> Token {
        self.resource.attr("Arn")
    }

    pub fn owner(&self) -> &StackName {
        self.resource.stack()
    }

    /// Read-only grant scoped to this one parameter
    pub fn grant_read(&self, principal: &Principal) -> Result<Grant, PolicyError> {
        Grant::scoped(
            principal.clone(),
            PARAMETER_READ_ACTIONS,
            [self.arn().to_string()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::ExecutionRole;
    use crate::domain::LogicalId;
    use serde_json::json;

    fn secret_handle() -> SecretHandle {
        let mut db = StackUnit::new(StackName::new("demo-rds").unwrap(), "db");
        let secret = db
            .add_resource("PostgreSQLSecret", ResourceType::Secret, &json!({}))
            .unwrap();
        SecretHandle::for_secret(&secret)
    }

    #[test]
    fn test_handle_exposes_identity_only() {
        let handle = secret_handle();
        assert_eq!(handle.owner().as_str(), "demo-rds");
        assert_eq!(
            handle.identity().arn().to_string(),
            "${Token[demo-rds/PostgreSQLSecret]}"
        );
    }

    #[test]
    fn test_grant_read_is_scoped_to_secret() {
        let handle = secret_handle();
        let role = ExecutionRole::new(LogicalId::new("FunctionRole").unwrap(), "lambda.amazonaws.com", "");
        let grant = handle.grant_read(&role.principal()).unwrap();
        assert_eq!(grant.actions(), SECRET_READ_ACTIONS);
        assert_eq!(grant.resources(), [handle.identity().arn().to_string()]);
        assert!(!grant.is_broad());
    }

    #[test]
    fn test_revoking_one_consumer_keeps_others() {
        let handle = secret_handle();
        let mut job = ExecutionRole::new(LogicalId::new("FunctionRole").unwrap(), "lambda.amazonaws.com", "");
        let mut notebook =
            ExecutionRole::new(LogicalId::new("NotebookRole").unwrap(), "sagemaker.amazonaws.com", "");
        let arn = handle.identity().arn().to_string();

        let job_grant = job.attach(handle.grant_read(&job.principal()).unwrap()).unwrap();
        notebook
            .attach(handle.grant_read(&notebook.principal()).unwrap())
            .unwrap();

        job.revoke(job_grant);
        assert!(!job.allows("secretsmanager:GetSecretValue", &arn));
        assert!(notebook.allows("secretsmanager:GetSecretValue", &arn));
    }

    #[test]
    fn test_parameter_pointer_references_secret() {
        let handle = secret_handle();
        let mut iam = StackUnit::new(StackName::new("demo-iam").unwrap(), "iam");
        let pointer =
            ParameterPointer::declare(&mut iam, "DbSecretArnParameter", "/demo/db-secret-arn", &handle)
                .unwrap();

        assert_eq!(pointer.name(), "/demo/db-secret-arn");
        assert_eq!(pointer.owner().as_str(), "demo-iam");
        let refs: Vec<String> = iam.references().iter().map(|s| s.to_string()).collect();
        assert_eq!(refs, vec!["demo-rds"]);

        let role = ExecutionRole::new(LogicalId::new("NotebookRole").unwrap(), "sagemaker.amazonaws.com", "");
        let grant = pointer.grant_read(&role.principal()).unwrap();
        assert_eq!(grant.resources(), [pointer.arn().to_string()]);
    }
}
