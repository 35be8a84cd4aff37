// Copyright (c) 2025 - Cowboy AI, Inc.
//! Object Storage Descriptors

use serde::Serialize;

use super::invariants::{validate_range, ValidationResult};
use super::{AssetSource, RemovalPolicy};

/// Bucket settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBucket {
    pub removal_policy: RemovalPolicy,
    /// Empty the bucket before deleting it
    pub auto_delete_objects: bool,
}

impl StorageBucket {
    /// Destroyed with its stack, objects included
    pub fn ephemeral() -> Self {
        Self {
            removal_policy: RemovalPolicy::Destroy,
            auto_delete_objects: true,
        }
    }
}

/// One-time upload of a local directory into a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetUpload {
    source: AssetSource,
    memory_limit: u32,
    ephemeral_storage_size: u32,
    prune: bool,
    retain_on_delete: bool,
}

impl AssetUpload {
    /// 256 MiB memory, 1024 MiB scratch space, no pruning, kept on delete
    pub fn new(source: AssetSource) -> Self {
        Self {
            source,
            memory_limit: 256,
            ephemeral_storage_size: 1024,
            prune: false,
            retain_on_delete: true,
        }
    }

    pub fn with_memory_limit(mut self, mib: u32) -> Self {
        self.memory_limit = mib;
        self
    }

    pub fn validate(&self) -> ValidationResult {
        validate_range("upload memory limit", self.memory_limit, 128, 10240)?;
        validate_range("upload ephemeral storage", self.ephemeral_storage_size, 512, 10240)
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    pub fn memory_limit(&self) -> u32 {
        self.memory_limit
    }

    pub fn ephemeral_storage_size(&self) -> u32 {
        self.ephemeral_storage_size
    }

    pub fn prune(&self) -> bool {
        self.prune
    }

    pub fn retain_on_delete(&self) -> bool {
        self.retain_on_delete
    }
}
