// Copyright (c) 2025 - Cowboy AI, Inc.
//! Notebook Stack
//!
//! The interactive environment sits in the first public subnet as a
//! database client. Everything it needs at first use arrives as tags:
//! the bucket name, the name of the parameter holding the secret ARN and
//! the inference endpoint name.

use serde::Serialize;
use tracing::debug;

use super::inference::InferenceStack;
use super::network::{NetworkStack, CLIENT_GROUP, PUBLIC_SUBNETS};
use super::role::RoleStack;
use super::storage::StorageStack;
use crate::composition::{ResourceRef, StackUnit, Token};
use crate::config::ENV_BUCKET_NAME;
use crate::domain::invariants::{
    validate_subnet_placement, validate_traffic_groups, ValidationError,
};
use crate::domain::{NotebookInstance, ResourceType, StackName, SubnetType};
use crate::errors::StackResult;

pub const TAG_SECRET_PARAMETER: &str = "DB_SECRET_ARN_PARAMETER";
pub const TAG_ENDPOINT_NAME: &str = "ENDPOINT_NAME";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    key: &'static str,
    value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct NotebookProperties<'a> {
    #[serde(flatten)]
    settings: &'a NotebookInstance,
    role_arn: Token,
    subnet_id: Token,
    security_group_ids: Vec<Token>,
    tags: Vec<Tag>,
}

/// Notebook unit plus the instance handle
#[derive(Debug, Clone)]
pub struct NotebookStack {
    pub unit: StackUnit,
    instance: ResourceRef,
}

impl NotebookStack {
    pub fn new(
        name: StackName,
        notebook: &NotebookInstance,
        network: &NetworkStack,
        storage: &StorageStack,
        role: &RoleStack,
        inference: &InferenceStack,
    ) -> StackResult<Self> {
        notebook.validate()?;
        let (group, subnet_type) = if notebook.needs_public_subnet() {
            (PUBLIC_SUBNETS, SubnetType::Public)
        } else {
            (super::network::PRIVATE_SUBNETS, SubnetType::PrivateIsolated)
        };
        validate_subnet_placement(network.topology(), group, subnet_type)?;
        validate_traffic_groups(network.topology(), [CLIENT_GROUP])?;
        let subnet_id = network
            .subnet_ids(group)
            .into_iter()
            .next()
            .ok_or_else(|| ValidationError::UnknownSubnetGroup(group.to_string()))?;

        let mut unit = StackUnit::new(name, "CDK Lab pgvector IGDB SageMaker Notebook Stack");
        let instance = unit.add_resource(
            "PgvectorDemoNotebook",
            ResourceType::NotebookInstance,
            &NotebookProperties {
                settings: notebook,
                role_arn: role.role_arn(),
                subnet_id,
                security_group_ids: network.traffic_group_id(CLIENT_GROUP).into_iter().collect(),
                tags: vec![
                    Tag {
                        key: ENV_BUCKET_NAME,
                        value: storage.bucket_name().to_string(),
                    },
                    Tag {
                        key: TAG_SECRET_PARAMETER,
                        value: role.parameter().name().to_string(),
                    },
                    Tag {
                        key: TAG_ENDPOINT_NAME,
                        value: inference.endpoint_name().to_string(),
                    },
                ],
            },
        )?;

        unit.add_output("NotebookInstanceARN", instance.reference())?;
        unit.add_output("NotebookInstanceName", instance.attr("NotebookInstanceName"))?;

        debug!(instance_type = notebook.instance_type(), "notebook stack declared");
        Ok(Self { unit, instance })
    }

    pub fn instance(&self) -> &ResourceRef {
        &self.instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AssetSource, AssetUpload, DbIdentifier, InferenceEndpoint, ManagedDatabase, ModelSpec,
        ServerlessConfig, StorageBucket,
    };
    use crate::stacks::network::demo_topology;
    use crate::stacks::DatabaseStack;

    fn stack(notebook: &NotebookInstance) -> StackResult<NotebookStack> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("games.json"), "[]").unwrap();
        let network = NetworkStack::new(
            StackName::new("lab-vpc").unwrap(),
            demo_topology("us-east-1").unwrap(),
        )?;
        let database = DatabaseStack::new(
            StackName::new("lab-demo-db").unwrap(),
            &ManagedDatabase::postgres(DbIdentifier::new("demo-db").unwrap(), "admin"),
            &network,
        )?;
        let storage = StorageStack::new(
            StackName::new("lab-s3").unwrap(),
            &StorageBucket::ephemeral(),
            &AssetUpload::new(AssetSource::from_dir(dir.path())?),
        )?;
        let role = RoleStack::new(StackName::new("lab-iam").unwrap(), "lab", &database, &storage)?;
        let inference = InferenceStack::new(
            StackName::new("lab-inference").unwrap(),
            "lab-igdb-embeddings",
            &InferenceEndpoint::new(
                ModelSpec::feature_extraction("image:1", "model"),
                ServerlessConfig {
                    memory_mib: 2048,
                    max_concurrency: 5,
                },
            ),
            role.role_arn(),
        )?;
        NotebookStack::new(
            StackName::new("lab-notebook").unwrap(),
            notebook,
            &network,
            &storage,
            &role,
            &inference,
        )
    }

    #[test]
    fn test_tags_carry_discovery_values() {
        let stack = stack(&NotebookInstance::new("https://example.com/repo.git")).unwrap();
        let props = stack.unit.resource("PgvectorDemoNotebook").unwrap().properties();
        let tags = props["Tags"].as_array().unwrap();
        assert_eq!(tags[0]["Key"], "BUCKET_NAME");
        assert_eq!(tags[0]["Value"], "${Token[lab-s3/AssetsBucket]}");
        assert_eq!(tags[1]["Key"], TAG_SECRET_PARAMETER);
        assert_eq!(tags[1]["Value"], "/lab/pgvector-igdb/db-secret-arn");
        assert_eq!(tags[2]["Key"], TAG_ENDPOINT_NAME);
        assert_eq!(
            tags[2]["Value"],
            "${Token[lab-inference/EmbeddingEndpoint.EndpointName]}"
        );
    }

    #[test]
    fn test_placed_in_public_subnet_as_client() {
        let stack = stack(&NotebookInstance::new("https://example.com/repo.git")).unwrap();
        let props = stack.unit.resource("PgvectorDemoNotebook").unwrap().properties();
        assert_eq!(props["SubnetId"], "${Token[lab-vpc/PublicSubnet1]}");
        assert_eq!(
            props["SecurityGroupIds"][0],
            "${Token[lab-vpc/DatabaseClientsSecurityGroup.GroupId]}"
        );
    }

    #[test]
    fn test_references_every_producer() {
        let stack = stack(&NotebookInstance::new("https://example.com/repo.git")).unwrap();
        let refs: Vec<String> = stack.unit.references().iter().map(|s| s.to_string()).collect();
        assert_eq!(refs, vec!["lab-iam", "lab-inference", "lab-s3", "lab-vpc"]);
    }
}
