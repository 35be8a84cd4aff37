// Copyright (c) 2025 - Cowboy AI, Inc.
//! AWS adapters: Secrets Manager credentials and S3 dataset download

use async_trait::async_trait;
use aws_config::SdkConfig;
use std::path::PathBuf;
use tracing::debug;

use super::{AssetStore, DatabaseCredentials, LoadError, SecretResolver};

/// Reads the database secret from Secrets Manager
pub struct SecretsManagerResolver {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerResolver {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(config),
        }
    }
}

#[async_trait]
impl SecretResolver for SecretsManagerResolver {
    async fn resolve(&self, secret_id: &str) -> Result<DatabaseCredentials, LoadError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| LoadError::CredentialResolution(e.to_string()))?;
        let secret = output.secret_string().ok_or_else(|| {
            LoadError::CredentialResolution("secret has no string value".to_string())
        })?;
        DatabaseCredentials::from_secret_string(secret)
    }
}

/// Downloads objects into a scratch directory, then reads them back
pub struct S3AssetStore {
    client: aws_sdk_s3::Client,
    scratch_dir: PathBuf,
}

impl S3AssetStore {
    /// Store downloading into `/tmp`
    pub fn new(config: &SdkConfig) -> Self {
        Self::with_scratch_dir(config, std::env::temp_dir())
    }

    pub fn with_scratch_dir(config: &SdkConfig, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            scratch_dir: scratch_dir.into(),
        }
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, LoadError> {
        let fail = |details: String| LoadError::AssetFetch {
            key: key.to_string(),
            details,
        };
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| fail(e.to_string()))?
            .into_bytes();

        let local = self.scratch_dir.join(key);
        tokio::fs::write(&local, &bytes)
            .await
            .map_err(|e| fail(format!("writing {}: {e}", local.display())))?;
        debug!(path = %local.display(), size = bytes.len(), "dataset downloaded");

        tokio::fs::read(&local)
            .await
            .map_err(|e| fail(format!("reading {}: {e}", local.display())))
    }
}
