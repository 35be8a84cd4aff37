// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Stack: the data-load function and its post-deployment trigger
//!
//! The function reads the database secret and the assets bucket through
//! scoped grants on its own role, runs in the private-isolated subnets as a
//! database client, and is invoked once, asynchronously, by a trigger
//! carrying the function's definition hash.

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::network::{NetworkStack, CLIENT_GROUP, PRIVATE_SUBNETS};
use super::storage::StorageStack;
use crate::access::{ExecutionRole, SecretHandle};
use crate::composition::{ResourceRef, StackUnit, Token};
use crate::config::{ENV_BUCKET_NAME, ENV_DB_SECRET_ARN};
use crate::domain::invariants::{validate_subnet_placement, validate_traffic_groups};
use crate::domain::{
    AssetSource, DataLoadFunction, DefinitionHash, LogicalId, RemovalPolicy, ResourceType,
    StackName, SubnetType,
};
use crate::errors::StackResult;

pub const FUNCTION_ID: &str = "DataLoadFunction";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct FunctionProperties<'a> {
    #[serde(flatten)]
    definition: &'a DataLoadFunction,
    role: Token,
    vpc_config: VpcConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VpcConfig {
    subnet_ids: Vec<Token>,
    security_group_ids: Vec<Token>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TriggerProperties<'a> {
    handler_arn: Token,
    #[serde(flatten)]
    policy: &'a crate::domain::TriggerPolicy,
    definition_hash: &'a DefinitionHash,
}

/// Compute unit plus the function handle and its definition hash
#[derive(Debug, Clone)]
pub struct ComputeStack {
    pub unit: StackUnit,
    function: ResourceRef,
    definition: DataLoadFunction,
    definition_hash: DefinitionHash,
}

impl ComputeStack {
    pub fn new(
        name: StackName,
        code: AssetSource,
        network: &NetworkStack,
        secret: &SecretHandle,
        storage: &StorageStack,
    ) -> StackResult<Self> {
        validate_subnet_placement(network.topology(), PRIVATE_SUBNETS, SubnetType::PrivateIsolated)?;
        validate_traffic_groups(network.topology(), [CLIENT_GROUP])?;

        let mut unit = StackUnit::new(name, "CDK Lab pgvector IGDB Lambda Stack");

        let mut role = ExecutionRole::new(
            LogicalId::new("DataLoadFunctionRole")?,
            "lambda.amazonaws.com",
            "Data load function role",
        );
        role.add_managed_policy("service-role/AWSLambdaVPCAccessExecutionRole");
        role.attach(secret.grant_read(&role.principal())?)?;
        role.attach(storage.grant_read(&role.principal())?)?;
        let role_ref = unit.add_resource(role.logical_id().as_str(), ResourceType::Role, &role)?;

        let definition = DataLoadFunction::new(code)
            .with_env(ENV_DB_SECRET_ARN, secret.identity().arn())
            .with_env(ENV_BUCKET_NAME, storage.bucket_name());
        definition.validate()?;
        let definition_hash = definition.definition_hash()?;

        let function = unit.add_resource(
            FUNCTION_ID,
            ResourceType::Function,
            &FunctionProperties {
                definition: &definition,
                role: role_ref.attr("Arn"),
                vpc_config: VpcConfig {
                    subnet_ids: network.subnet_ids(PRIVATE_SUBNETS),
                    security_group_ids: network.traffic_group_id(CLIENT_GROUP).into_iter().collect(),
                },
            },
        )?;

        unit.add_resource_with_removal(
            "DataLoadFunctionLogGroup",
            ResourceType::LogGroup,
            &json!({
                "LogGroupName": format!("/aws/lambda/{}", function.reference()),
                "RetentionInDays": definition.log_retention().days(),
            }),
            RemovalPolicy::Destroy,
        )?;

        unit.add_resource(
            "DataLoadTrigger",
            ResourceType::Trigger,
            &TriggerProperties {
                handler_arn: function.attr("Arn"),
                policy: definition.trigger(),
                definition_hash: &definition_hash,
            },
        )?;

        unit.add_output("LambdaFunctionName", function.reference())?;
        unit.add_output("LambdaFunctionArn", function.attr("Arn"))?;

        debug!(hash = %definition_hash, "compute stack declared");
        Ok(Self {
            unit,
            function,
            definition,
            definition_hash,
        })
    }

    pub fn function(&self) -> &ResourceRef {
        &self.function
    }

    pub fn definition(&self) -> &DataLoadFunction {
        &self.definition
    }

    pub fn definition_hash(&self) -> &DefinitionHash {
        &self.definition_hash
    }
}
