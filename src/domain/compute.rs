// Copyright (c) 2025 - Cowboy AI, Inc.
//! Data-Load Function Descriptor
//!
//! The function definition is everything that, when changed, should make
//! the post-deployment trigger fire again: code digest, runtime, handler,
//! timeout, memory and environment. Its [`DefinitionHash`] is SHA-256 over
//! the canonical JSON of that definition. Where the code lives on the
//! synthesizing machine is not part of it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use super::asset::hex;
use super::invariants::{validate_non_empty, validate_range, ValidationResult};
use super::{AssetSource, RetentionDays};

/// Hex SHA-256 of a job definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionHash(String);

impl DefinitionHash {
    /// Hash a serializable definition's canonical JSON
    ///
    /// `serde_json::Value` objects keep keys sorted, so equal definitions
    /// always hash equally regardless of field order.
    pub fn of<T: Serialize>(definition: &T) -> Result<Self, serde_json::Error> {
        let canonical = serde_json::to_vec(&serde_json::to_value(definition)?)?;
        Ok(Self(hex(&Sha256::digest(&canonical))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the trigger invokes the function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum InvocationType {
    /// Fire and forget
    Event,
    /// Wait for the result
    RequestResponse,
}

/// When the post-deployment trigger fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TriggerPolicy {
    pub invocation_type: InvocationType,
    /// Fire again whenever the function definition changes
    pub execute_on_handler_change: bool,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            invocation_type: InvocationType::Event,
            execute_on_handler_change: true,
        }
    }
}

/// Function settings that make up its definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataLoadFunction {
    code: AssetSource,
    runtime: String,
    handler: String,
    timeout: u32,
    memory_size: u32,
    environment: BTreeMap<String, String>,
    #[serde(skip)]
    log_retention: RetentionDays,
    #[serde(skip)]
    trigger: TriggerPolicy,
}

/// Location-independent view of a definition
#[derive(Serialize)]
struct HashedDefinition<'a> {
    code_digest: &'a str,
    runtime: &'a str,
    handler: &'a str,
    timeout: u32,
    memory_size: u32,
    environment: &'a BTreeMap<String, String>,
}

impl DataLoadFunction {
    /// 60 s timeout, one-day logs, event trigger on definition change
    pub fn new(code: AssetSource) -> Self {
        Self {
            code,
            runtime: "python3.11".to_string(),
            handler: "index.handler".to_string(),
            timeout: 60,
            memory_size: 512,
            environment: BTreeMap::new(),
            log_retention: RetentionDays::OneDay,
            trigger: TriggerPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_memory(mut self, mib: u32) -> Self {
        self.memory_size = mib;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.environment.insert(key.into(), value.to_string());
        self
    }

    pub fn validate(&self) -> ValidationResult {
        validate_non_empty("runtime", &self.runtime)?;
        validate_non_empty("handler", &self.handler)?;
        validate_range("timeout", self.timeout, 1, 900)?;
        validate_range("memory size", self.memory_size, 128, 10240)
    }

    pub fn definition_hash(&self) -> Result<DefinitionHash, serde_json::Error> {
        DefinitionHash::of(&HashedDefinition {
            code_digest: self.code.digest(),
            runtime: &self.runtime,
            handler: &self.handler,
            timeout: self.timeout,
            memory_size: self.memory_size,
            environment: &self.environment,
        })
    }

    pub fn code(&self) -> &AssetSource {
        &self.code
    }

    pub fn timeout(&self) -> u32 {
        self.timeout
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn log_retention(&self) -> RetentionDays {
        self.log_retention
    }

    pub fn trigger(&self) -> &TriggerPolicy {
        &self.trigger
    }
}
