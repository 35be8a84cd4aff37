// Copyright (c) 2025 - Cowboy AI, Inc.
//! Execution Role Stack
//!
//! The role the managed ML service assumes for the notebook and the
//! inference model. It also hosts the parameter pointer that tells the
//! notebook where the database secret lives.

use tracing::debug;

use super::database::DatabaseStack;
use super::storage::StorageStack;
use crate::access::{ExecutionRole, Grant, ParameterPointer};
use crate::composition::{ResourceRef, StackUnit, Token};
use crate::domain::{LogicalId, RemovalPolicy, ResourceType, StackName};
use crate::errors::StackResult;

/// Secret-reading actions the notebook code uses
pub const NOTEBOOK_SECRET_ACTIONS: [&str; 4] = [
    "secretsmanager:GetResourcePolicy",
    "secretsmanager:GetSecretValue",
    "secretsmanager:DescribeSecret",
    "secretsmanager:ListSecretVersionIds",
];

/// Actions with no resource-level scoping
pub const UNSCOPED_SECRET_ACTIONS: [&str; 2] =
    ["secretsmanager:GetRandomPassword", "secretsmanager:ListSecrets"];

/// Role unit plus the role and parameter handles
#[derive(Debug, Clone)]
pub struct RoleStack {
    pub unit: StackUnit,
    role: ResourceRef,
    parameter: ParameterPointer,
}

impl RoleStack {
    pub fn new(
        name: StackName,
        prefix: &str,
        database: &DatabaseStack,
        storage: &StorageStack,
    ) -> StackResult<Self> {
        let mut unit = StackUnit::new(name, "CDK Lab pgvector IGDB IAM Stack");
        let secret = database.secret();

        let parameter = ParameterPointer::declare(
            &mut unit,
            "DbSecretArnParameter",
            format!("/{prefix}/pgvector-igdb/db-secret-arn"),
            secret,
        )?;

        let mut role = ExecutionRole::new(
            LogicalId::new("SageMakerExecutionRole")?,
            "sagemaker.amazonaws.com",
            "SageMaker Execution Role",
        );
        role.add_managed_policy("AmazonSageMakerFullAccess");
        role.add_managed_policy("SecretsManagerReadWrite");

        let principal = role.principal();
        role.attach(Grant::scoped(
            principal.clone(),
            NOTEBOOK_SECRET_ACTIONS,
            [secret.identity().arn().to_string()],
        )?)?;
        role.attach(Grant::broad(
            principal.clone(),
            UNSCOPED_SECRET_ACTIONS,
            "secret listing and password generation have no resource scope",
        )?)?;
        role.attach(Grant::scoped(
            principal.clone(),
            ["rds:DescribeDBInstances"],
            [database.instance_arn().to_string()],
        )?)?;
        role.attach(storage.grant_read(&principal)?)?;
        role.attach(parameter.grant_read(&principal)?)?;

        let role_ref = unit.add_resource_with_removal(
            role.logical_id().as_str(),
            ResourceType::Role,
            &role,
            RemovalPolicy::Destroy,
        )?;

        unit.add_output("SageMakerRoleName", role_ref.reference())?;
        unit.add_output("SageMakerRoleARN", role_ref.attr("Arn"))?;

        debug!(parameter = parameter.name(), "role stack declared");
        Ok(Self {
            unit,
            role: role_ref,
            parameter,
        })
    }

    pub fn role(&self) -> &ResourceRef {
        &self.role
    }

    pub fn role_arn(&self) -> Token {
        self.role.attr("Arn")
    }

    pub fn parameter(&self) -> &ParameterPointer {
        &self.parameter
    }
}
