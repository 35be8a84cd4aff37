// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inference Model and Serverless Endpoint Descriptors
//!
//! Models and endpoint configurations cannot be updated in place. The set
//! is named after a revision hash of both, so any change produces new
//! names and the engine replaces the set instead of attempting an update.

use serde::Serialize;
use std::collections::BTreeMap;

use super::invariants::{validate_non_empty, validate_one_of, validate_range, ValidationResult};
use super::DefinitionHash;

/// Serverless memory sizes accepted by the service
pub const SERVERLESS_MEMORY_SIZES: [u32; 6] = [1024, 2048, 3072, 4096, 5120, 6144];

/// Upper bound on serverless concurrency
pub const MAX_SERVERLESS_CONCURRENCY: u32 = 200;

/// Container image plus model artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelSpec {
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_data_url: Option<String>,
    environment: BTreeMap<String, String>,
}

impl ModelSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            model_data_url: None,
            environment: BTreeMap::new(),
        }
    }

    /// Sentence-embedding model pulled from the Hugging Face hub
    pub fn feature_extraction(image: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self::new(image)
            .with_env("HF_MODEL_ID", model_id)
            .with_env("HF_TASK", "feature-extraction")
    }

    pub fn with_model_data(mut self, url: impl Into<String>) -> Self {
        self.model_data_url = Some(url.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn model_data_url(&self) -> Option<&str> {
        self.model_data_url.as_deref()
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }
}

/// Serverless capacity ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerlessConfig {
    #[serde(rename = "MemorySizeInMB")]
    pub memory_mib: u32,
    pub max_concurrency: u32,
}

impl ServerlessConfig {
    pub fn validate(&self) -> ValidationResult {
        validate_one_of("serverless memory", self.memory_mib, &SERVERLESS_MEMORY_SIZES)?;
        validate_range(
            "serverless max concurrency",
            self.max_concurrency,
            1,
            MAX_SERVERLESS_CONCURRENCY,
        )
    }
}

/// Model, endpoint configuration and endpoint, replaced as one set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferenceEndpoint {
    model: ModelSpec,
    serverless: ServerlessConfig,
}

impl InferenceEndpoint {
    pub fn new(model: ModelSpec, serverless: ServerlessConfig) -> Self {
        Self { model, serverless }
    }

    pub fn validate(&self) -> ValidationResult {
        validate_non_empty("model image", &self.model.image)?;
        self.serverless.validate()
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    pub fn serverless(&self) -> ServerlessConfig {
        self.serverless
    }

    /// Short hash naming this revision of the set
    pub fn revision(&self) -> Result<String, serde_json::Error> {
        let hash = DefinitionHash::of(self)?;
        Ok(hash.as_str()[..8].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn endpoint(memory_mib: u32, max_concurrency: u32) -> InferenceEndpoint {
        InferenceEndpoint::new(
            ModelSpec::feature_extraction("image:latest", "sentence-transformers/all-MiniLM-L6-v2"),
            ServerlessConfig {
                memory_mib,
                max_concurrency,
            },
        )
    }

    #[test_case(2048, 5, true ; "defaults")]
    #[test_case(6144, 200, true ; "upper bounds")]
    #[test_case(1500, 5, false ; "memory not a step")]
    #[test_case(8192, 5, false ; "memory too large")]
    #[test_case(1024, 0, false ; "zero concurrency")]
    #[test_case(1024, 201, false ; "concurrency too large")]
    fn test_serverless_limits(memory: u32, concurrency: u32, ok: bool) {
        assert_eq!(endpoint(memory, concurrency).validate().is_ok(), ok);
    }

    #[test]
    fn test_revision_changes_with_definition() {
        let a = endpoint(2048, 5);
        assert_eq!(a.revision().unwrap(), endpoint(2048, 5).revision().unwrap());
        assert_ne!(a.revision().unwrap(), endpoint(3072, 5).revision().unwrap());
        assert_eq!(a.revision().unwrap().len(), 8);
    }

    #[test]
    fn test_model_environment() {
        let model = endpoint(2048, 5).model().clone();
        assert_eq!(model.environment()["HF_TASK"], "feature-extraction");
        assert!(model.model_data_url().is_none());
    }
}
