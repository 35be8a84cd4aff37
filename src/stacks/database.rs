// Copyright (c) 2025 - Cowboy AI, Inc.
//! Database Stack
//!
//! Owns the PostgreSQL instance and the one secret holding its master
//! credentials. The password enters as a no-echo deploy-time parameter and
//! is never part of the plan; every other unit sees only the
//! [`SecretHandle`].

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::network::{NetworkStack, DATABASE_GROUP, PRIVATE_SUBNETS};
use crate::access::SecretHandle;
use crate::composition::{ResourceRef, StackUnit, Token};
use crate::domain::invariants::{validate_subnet_placement, validate_traffic_groups};
use crate::domain::{ManagedDatabase, RemovalPolicy, ResourceType, StackName, SubnetType};
use crate::errors::StackResult;

/// Deploy-time parameter carrying the master password
pub const MASTER_PASSWORD_PARAMETER: &str = "DatabaseMasterPassword";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceProperties<'a> {
    #[serde(flatten)]
    settings: &'a ManagedDatabase,
    master_username: String,
    master_user_password: String,
    #[serde(rename = "DBSubnetGroupName")]
    subnet_group_name: Token,
    #[serde(rename = "VPCSecurityGroups")]
    security_groups: Vec<Token>,
    publicly_accessible: bool,
    enable_cloudwatch_logs_exports: [&'static str; 1],
}

/// Database unit plus its instance and secret handles
#[derive(Debug, Clone)]
pub struct DatabaseStack {
    pub unit: StackUnit,
    instance: ResourceRef,
    secret: SecretHandle,
}

impl DatabaseStack {
    pub fn new(name: StackName, database: &ManagedDatabase, network: &NetworkStack) -> StackResult<Self> {
        database.validate()?;
        validate_subnet_placement(network.topology(), PRIVATE_SUBNETS, SubnetType::PrivateIsolated)?;
        validate_traffic_groups(network.topology(), [DATABASE_GROUP])?;

        let mut unit = StackUnit::new(name, "CDK Lab pgvector IGDB RDS Stack");
        let identifier = database.identifier();

        let password = unit.add_parameter(
            MASTER_PASSWORD_PARAMETER,
            "Master password of the PostgreSQL instance",
            true,
        )?;
        let secret_string = json!({
            "username": database.master_username(),
            "password": password,
        })
        .to_string();
        let secret = unit.add_resource(
            "PostgreSQLSecret",
            ResourceType::Secret,
            &json!({
                "Name": format!("{identifier}-credentials"),
                "Description": format!("Master credentials of {identifier}"),
                "SecretString": secret_string,
            }),
        )?;

        let subnet_group = unit.add_resource(
            "PostgreSQLSubnetGroup",
            ResourceType::DatabaseSubnetGroup,
            &json!({
                "DBSubnetGroupDescription": format!("Private subnets of {identifier}"),
                "SubnetIds": network.subnet_ids(PRIVATE_SUBNETS),
            }),
        )?;

        let security_groups = network.traffic_group_id(DATABASE_GROUP).into_iter().collect();
        let instance = unit.add_resource_with_removal(
            "PostgreSQL",
            ResourceType::DatabaseInstance,
            &InstanceProperties {
                settings: database,
                master_username: database.master_username().to_string(),
                master_user_password: format!(
                    "{{{{resolve:secretsmanager:{}:SecretString:password}}}}",
                    secret.reference()
                ),
                subnet_group_name: subnet_group.reference(),
                security_groups,
                publicly_accessible: false,
                enable_cloudwatch_logs_exports: ["postgresql"],
            },
            RemovalPolicy::Destroy,
        )?;

        unit.add_resource_with_removal(
            "PostgreSQLLogGroup",
            ResourceType::LogGroup,
            &json!({
                "LogGroupName": format!("/aws/rds/instance/{identifier}/postgresql"),
                "RetentionInDays": database.log_retention().days(),
            }),
            RemovalPolicy::Destroy,
        )?;

        unit.add_resource(
            "PostgreSQLSecretAttachment",
            ResourceType::SecretTargetAttachment,
            &json!({
                "SecretId": secret.reference(),
                "TargetId": instance.reference(),
                "TargetType": ResourceType::DatabaseInstance.engine_type(),
            }),
        )?;

        unit.add_output("DatabaseInstanceIdentifier", instance.reference())?;
        unit.add_output("DatabaseInstanceARN", instance.attr("DBInstanceArn"))?;
        unit.add_output("DatabaseSecretName", secret.attr("Name"))?;
        unit.add_output("DatabaseSecretARN", secret.reference())?;

        debug!(%identifier, stack = %unit.name(), "database stack declared");
        Ok(Self {
            unit,
            secret: SecretHandle::for_secret(&secret),
            instance,
        })
    }

    /// ARN-equivalent of the instance
    pub fn instance_arn(&self) -> Token {
        self.instance.attr("DBInstanceArn")
    }

    pub fn secret(&self) -> &SecretHandle {
        &self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DbIdentifier;
    use crate::stacks::network::demo_topology;

    fn network() -> NetworkStack {
        NetworkStack::new(
            StackName::new("lab-pgvector-igdb-vpc").unwrap(),
            demo_topology("us-east-1").unwrap(),
        )
        .unwrap()
    }

    fn stack() -> DatabaseStack {
        let db = ManagedDatabase::postgres(DbIdentifier::new("demo-db").unwrap(), "admin");
        DatabaseStack::new(
            StackName::new("lab-pgvector-igdb-demo-db").unwrap(),
            &db,
            &network(),
        )
        .unwrap()
    }

    #[test]
    fn test_outputs_published() {
        let stack = stack();
        let keys: Vec<&str> = stack.unit.outputs().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "DatabaseInstanceARN",
                "DatabaseInstanceIdentifier",
                "DatabaseSecretARN",
                "DatabaseSecretName"
            ]
        );
        assert_eq!(stack.secret().owner().as_str(), "lab-pgvector-igdb-demo-db");
    }

    #[test]
    fn test_instance_placement_and_settings() {
        let stack = stack();
        let props = stack.unit.resource("PostgreSQL").unwrap().properties().clone();
        assert_eq!(props["DBInstanceIdentifier"], "demo-db");
        assert_eq!(props["Port"], 5432);
        assert_eq!(props["PubliclyAccessible"], false);
        assert_eq!(
            props["VPCSecurityGroups"][0],
            "${Token[lab-pgvector-igdb-vpc/DatabaseSecurityGroup.GroupId]}"
        );
        assert_eq!(
            stack.unit.resource("PostgreSQL").unwrap().removal_policy(),
            Some(RemovalPolicy::Destroy)
        );
        let refs: Vec<String> = stack.unit.references().iter().map(|s| s.to_string()).collect();
        assert_eq!(refs, vec!["lab-pgvector-igdb-vpc"]);
    }

    #[test]
    fn test_password_is_a_parameter() {
        let stack = stack();
        assert!(stack.unit.parameters()[MASTER_PASSWORD_PARAMETER].no_echo);
        let secret = stack.unit.resource("PostgreSQLSecret").unwrap();
        let secret_string = secret.properties()["SecretString"].as_str().unwrap();
        assert!(secret_string.contains("{{param:DatabaseMasterPassword}}"));
        assert!(secret_string.contains("\"username\":\"admin\""));
    }
}
