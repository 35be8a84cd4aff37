// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Configuration
//!
//! Every setting is read once, in `main`, from an optional `.env` file plus
//! the process environment, and then passed explicitly to the stack
//! constructors. Nothing below `main` looks at the environment.
//!
//! Required values are checked in a fixed order so the error always names
//! the first missing variable:
//!
//! ```text
//! DB_IDENTIFIER → DB_USERNAME → DB_PASSWORD
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::domain::{DbIdentifier, StackName};

/// Configuration error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Failed to read env file {path}: {details}")]
    EnvFile { path: String, details: String },

    #[error("No value configured for deploy-time parameter '{0}'")]
    UnboundParameter(String),
}

pub const ENV_ACCOUNT: &str = "CDK_DEFAULT_ACCOUNT";
pub const ENV_REGION: &str = "CDK_DEFAULT_REGION";
pub const ENV_PREFIX: &str = "STACK_PREFIX";
pub const ENV_DB_IDENTIFIER: &str = "DB_IDENTIFIER";
pub const ENV_DB_USERNAME: &str = "DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_SECRET_ARN: &str = "DB_SECRET_ARN";
pub const ENV_BUCKET_NAME: &str = "BUCKET_NAME";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PREFIX: &str = "cdklab";
pub const DEFAULT_NOTEBOOK_REPOSITORY: &str =
    "https://github.com/Vivicorp-AWS/cdk-lab-pgvector-igdb.git";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// String whose value never appears in `Debug` or `Display` output
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for handing to the provisioning engine only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sensitive(\"***\")")
    }
}

impl fmt::Display for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Master credentials and identifier for the managed database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseParams {
    pub identifier: DbIdentifier,
    pub username: String,
    pub password: Sensitive,
}

/// Model and serving settings for the inference endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceParams {
    pub image_uri: String,
    pub model_data_url: Option<String>,
    pub model_id: String,
    pub memory_mib: u32,
    pub max_concurrency: u32,
}

impl InferenceParams {
    /// Hugging Face CPU inference image published for `region`
    pub fn default_image(region: &str) -> String {
        format!(
            "763104351884.dkr.ecr.{region}.amazonaws.com/huggingface-pytorch-inference:1.13.1-transformers4.26.0-cpu-py39-ubuntu20.04"
        )
    }
}

/// Everything the stack constructors need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub account: Option<String>,
    pub region: String,
    pub prefix: String,
    pub database: DatabaseParams,
    pub assets_dir: PathBuf,
    pub job_code_dir: PathBuf,
    pub inference: InferenceParams,
    pub notebook_repository: String,
}

impl DeploymentConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let identifier = required(ENV_DB_IDENTIFIER)?;
        let username = required(ENV_DB_USERNAME)?;
        let password = required(ENV_DB_PASSWORD)?;

        let identifier = DbIdentifier::new(&identifier).map_err(|e| ConfigError::ParseError {
            key: ENV_DB_IDENTIFIER.to_string(),
            details: e.to_string(),
        })?;

        let prefix = get(ENV_PREFIX).unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        StackName::new(&prefix).map_err(|e| ConfigError::ParseError {
            key: ENV_PREFIX.to_string(),
            details: e.to_string(),
        })?;

        let region = get(ENV_REGION)
            .or_else(|| get("AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let inference = InferenceParams {
            image_uri: get("INFERENCE_IMAGE_URI")
                .unwrap_or_else(|| InferenceParams::default_image(&region)),
            model_data_url: get("INFERENCE_MODEL_DATA_URL"),
            model_id: get("INFERENCE_MODEL_ID")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            memory_mib: parse_or(&get, "INFERENCE_MEMORY_MIB", 2048)?,
            max_concurrency: parse_or(&get, "INFERENCE_MAX_CONCURRENCY", 5)?,
        };

        let config = Self {
            account: get(ENV_ACCOUNT),
            region,
            prefix,
            database: DatabaseParams {
                identifier,
                username,
                password: Sensitive::new(password),
            },
            assets_dir: get("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("assets")),
            job_code_dir: get("JOB_CODE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("lambda")),
            inference,
            notebook_repository: get("NOTEBOOK_REPOSITORY")
                .unwrap_or_else(|| DEFAULT_NOTEBOOK_REPOSITORY.to_string()),
        };
        debug!(prefix = %config.prefix, region = %config.region, "deployment configuration loaded");
        Ok(config)
    }

    /// Replace the naming prefix (`--prefix` wins over `STACK_PREFIX`)
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let prefix = prefix.into();
        StackName::new(&prefix).map_err(|e| ConfigError::ParseError {
            key: "--prefix".to_string(),
            details: e.to_string(),
        })?;
        self.prefix = prefix;
        Ok(self)
    }

    /// Value for a deploy-time parameter declared by a stack unit
    pub fn parameter_value(&self, name: &str) -> Option<&Sensitive> {
        match name {
            crate::stacks::database::MASTER_PASSWORD_PARAMETER => Some(&self.database.password),
            _ => None,
        }
    }
}

fn parse_or<G>(get: &G, key: &str, default: u32) -> Result<u32, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::ParseError {
                key: key.to_string(),
                details: e.to_string(),
            }
        }),
    }
}

/// Load `.env` into the process environment
///
/// With an explicit path the file must exist. Without one, a missing
/// `.env` in the working directory is not an error. Variables already set
/// in the environment are never overwritten.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|_| Some(path.to_path_buf()))
            .map_err(|e| ConfigError::EnvFile {
                path: path.display().to_string(),
                details: e.to_string(),
            }),
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(ConfigError::EnvFile {
                path: ".env".to_string(),
                details: e.to_string(),
            }),
        },
    }
}

/// Write `contents` readable by the owner only
///
/// The mode is applied before anything is written, including when the file
/// already exists with wider permissions.
#[cfg(unix)]
pub fn write_private_file(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.set_len(0)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
pub fn write_private_file(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// Runtime inputs of the data-load job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEnvironment {
    pub secret_id: String,
    pub bucket_name: String,
}

impl JobEnvironment {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        Ok(Self {
            secret_id: required(ENV_DB_SECRET_ARN)?,
            bucket_name: required(ENV_BUCKET_NAME)?,
        })
    }
}
