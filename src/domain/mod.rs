// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Domain Models
//!
//! Validated value objects and descriptors for everything a stack unit can
//! declare. Descriptors carry settings only; cross-unit wiring (tokens,
//! grants, dependency edges) lives in [`crate::composition`] and
//! [`crate::access`].
//!
//! # Value Objects with Invariants
//!
//! - [`StackName`], [`LogicalId`], [`DbIdentifier`] - engine naming rules
//! - [`Ipv4Block`] - aligned IPv4 CIDR blocks
//! - [`NetworkTopology`] - address range, per-AZ subnets, traffic groups
//! - [`ResourceType`] - resource taxonomy
//! - [`DefinitionHash`] - content hash of a job definition
//!
//! # Descriptors
//!
//! - [`ManagedDatabase`], [`StorageBucket`], [`AssetUpload`]
//! - [`DataLoadFunction`], [`InferenceEndpoint`], [`NotebookInstance`]

pub mod asset;
pub mod compute;
pub mod database;
pub mod inference;
pub mod invariants;
pub mod lifecycle;
pub mod names;
pub mod network;
pub mod notebook;
pub mod resource_type;
pub mod storage;

pub use asset::{AssetError, AssetSource};
pub use compute::{DataLoadFunction, DefinitionHash, InvocationType, TriggerPolicy};
pub use database::ManagedDatabase;
pub use inference::{InferenceEndpoint, ModelSpec, ServerlessConfig};
pub use invariants::{ValidationError, ValidationResult};
pub use lifecycle::{RemovalPolicy, RetentionDays};
pub use names::{DbIdentifier, LogicalId, NameError, StackName};
pub use network::{
    DefaultRoute, Ipv4Block, NetworkError, NetworkTopology, NetworkTopologyBuilder, Subnet,
    SubnetGroup, SubnetType, TrafficGroup, TrafficProtocol, TrafficRule,
};
pub use notebook::{NotebookInstance, Toggle};
pub use resource_type::{ResourceCategory, ResourceType};
pub use storage::{AssetUpload, StorageBucket};
