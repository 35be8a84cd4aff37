// Copyright (c) 2025 - Cowboy AI, Inc.
//! Storage Stack: assets bucket and its one-time upload

use serde_json::json;
use tracing::debug;

use crate::access::{Grant, PolicyError, Principal};
use crate::composition::{ResourceRef, StackUnit, Token};
use crate::domain::{AssetUpload, ResourceType, StackName, StorageBucket};
use crate::errors::StackResult;

/// Actions a bucket reader needs
pub const BUCKET_READ_ACTIONS: [&str; 3] = ["s3:GetObject*", "s3:GetBucket*", "s3:List*"];

/// Storage unit plus the bucket handle
#[derive(Debug, Clone)]
pub struct StorageStack {
    pub unit: StackUnit,
    bucket: ResourceRef,
}

impl StorageStack {
    pub fn new(name: StackName, bucket: &StorageBucket, upload: &AssetUpload) -> StackResult<Self> {
        upload.validate()?;
        let mut unit = StackUnit::new(name, "CDK Lab pgvector IGDB S3 Stack");

        let bucket_ref = unit.add_resource_with_removal(
            "AssetsBucket",
            ResourceType::Bucket,
            &json!({
                "AutoDeleteObjects": bucket.auto_delete_objects,
                "PublicAccessBlockConfiguration": {
                    "BlockPublicAcls": true,
                    "BlockPublicPolicy": true,
                    "IgnorePublicAcls": true,
                    "RestrictPublicBuckets": true,
                },
            }),
            bucket.removal_policy,
        )?;

        let mut deployment = serde_json::to_value(upload)?;
        if let Some(props) = deployment.as_object_mut() {
            props.insert(
                "DestinationBucketName".to_string(),
                serde_json::to_value(bucket_ref.reference())?,
            );
        }
        unit.add_resource("AssetsDeployment", ResourceType::BucketDeployment, &deployment)?;

        unit.add_output("BucketName", bucket_ref.reference())?;
        unit.add_output("BucketARN", bucket_ref.attr("Arn"))?;

        debug!(digest = upload.source().digest(), "storage stack declared");
        Ok(Self {
            unit,
            bucket: bucket_ref,
        })
    }

    pub fn bucket(&self) -> &ResourceRef {
        &self.bucket
    }

    pub fn bucket_name(&self) -> Token {
        self.bucket.reference()
    }

    pub fn bucket_arn(&self) -> Token {
        self.bucket.attr("Arn")
    }

    /// Read grant on the bucket and every object in it
    pub fn grant_read(&self, principal: &Principal) -> Result<Grant, PolicyError> {
        let arn = self.bucket_arn().to_string();
        Grant::scoped(
            principal.clone(),
            BUCKET_READ_ACTIONS,
            [arn.clone(), format!("{arn}/*")],
        )
    }
}
