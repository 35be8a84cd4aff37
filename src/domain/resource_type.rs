// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Resource Type Domain Model
//!
//! The closed vocabulary of resource kinds a stack unit may declare. Each
//! kind maps to the provisioning engine's type name so a synthesized plan can
//! be handed to the engine unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    // Network
    Vpc,
    Subnet,
    InternetGateway,
    RouteTable,
    SecurityGroup,

    // Secrets and parameters
    Secret,
    SecretTargetAttachment,
    Parameter,

    // Data
    DatabaseSubnetGroup,
    DatabaseInstance,
    Bucket,
    BucketDeployment,

    // Compute
    Function,
    Trigger,
    LogGroup,

    // Identity
    Role,
    Policy,

    // Machine learning
    Model,
    EndpointConfig,
    Endpoint,
    NotebookInstance,
}

impl ResourceType {
    /// Provisioning engine type name
    pub fn engine_type(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::Secret => "AWS::SecretsManager::Secret",
            Self::SecretTargetAttachment => "AWS::SecretsManager::SecretTargetAttachment",
            Self::Parameter => "AWS::SSM::Parameter",
            Self::DatabaseSubnetGroup => "AWS::RDS::DBSubnetGroup",
            Self::DatabaseInstance => "AWS::RDS::DBInstance",
            Self::Bucket => "AWS::S3::Bucket",
            Self::BucketDeployment => "Custom::CDKBucketDeployment",
            Self::Function => "AWS::Lambda::Function",
            Self::Trigger => "Custom::Trigger",
            Self::LogGroup => "AWS::Logs::LogGroup",
            Self::Role => "AWS::IAM::Role",
            Self::Policy => "AWS::IAM::Policy",
            Self::Model => "AWS::SageMaker::Model",
            Self::EndpointConfig => "AWS::SageMaker::EndpointConfig",
            Self::Endpoint => "AWS::SageMaker::Endpoint",
            Self::NotebookInstance => "AWS::SageMaker::NotebookInstance",
        }
    }

    /// Get the category this kind belongs to
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::Subnet
            | Self::InternetGateway
            | Self::RouteTable
            | Self::SecurityGroup => ResourceCategory::Network,
            Self::Secret | Self::SecretTargetAttachment | Self::Parameter => {
                ResourceCategory::Secrets
            }
            Self::DatabaseSubnetGroup
            | Self::DatabaseInstance
            | Self::Bucket
            | Self::BucketDeployment => ResourceCategory::Data,
            Self::Function | Self::Trigger | Self::LogGroup => ResourceCategory::Compute,
            Self::Role | Self::Policy => ResourceCategory::Identity,
            Self::Model | Self::EndpointConfig | Self::Endpoint | Self::NotebookInstance => {
                ResourceCategory::MachineLearning
            }
        }
    }

    /// Whether the control plane replaces rather than updates this kind
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Model | Self::EndpointConfig)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.engine_type())
    }
}

/// Resource category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Network,
    Secrets,
    Data,
    Compute,
    Identity,
    MachineLearning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_types() {
        assert_eq!(ResourceType::Vpc.engine_type(), "AWS::EC2::VPC");
        assert_eq!(
            ResourceType::DatabaseInstance.to_string(),
            "AWS::RDS::DBInstance"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(ResourceType::SecurityGroup.category(), ResourceCategory::Network);
        assert_eq!(ResourceType::Parameter.category(), ResourceCategory::Secrets);
        assert_eq!(
            ResourceType::NotebookInstance.category(),
            ResourceCategory::MachineLearning
        );
    }

    #[test]
    fn test_immutable_kinds() {
        assert!(ResourceType::Model.is_immutable());
        assert!(ResourceType::EndpointConfig.is_immutable());
        assert!(!ResourceType::Endpoint.is_immutable());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&ResourceType::SecretTargetAttachment).unwrap();
        assert_eq!(json, "\"secret_target_attachment\"");
    }
}
