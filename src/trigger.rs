// Copyright (c) 2025 - Cowboy AI, Inc.
//! Post-Deployment Trigger Decisions
//!
//! The data-load job runs after a deployment only when its definition hash
//! differs from the one recorded by the last deployment that invoked it.
//! Records persist in a small JSON state file between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::DefinitionHash;

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Deployment state I/O failed for {path}: {details}")]
    Io { path: String, details: String },

    #[error("Deployment state at {path} is corrupt: {details}")]
    Corrupt { path: String, details: String },
}

/// Last invocation of one trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub hash: DefinitionHash,
    pub recorded_at: DateTime<Utc>,
    pub invocations: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// First deployment, or the definition changed
    Invoke,
    /// Definition unchanged since the last invocation
    Skip,
}

/// Persisted trigger records, keyed by `"{unit}/{function}"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub version: u32,
    #[serde(default)]
    pub triggers: BTreeMap<String, TriggerRecord>,
}

impl Default for DeploymentState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            triggers: BTreeMap::new(),
        }
    }
}

impl DeploymentState {
    /// Load state; a missing file is an empty state
    pub fn load(path: &Path) -> Result<Self, TriggerError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no deployment state yet");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(TriggerError::Io {
                    path: path.display().to_string(),
                    details: e.to_string(),
                })
            }
        };
        let state: Self = serde_json::from_str(&text).map_err(|e| TriggerError::Corrupt {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        if state.version != STATE_VERSION {
            return Err(TriggerError::Corrupt {
                path: path.display().to_string(),
                details: format!("unsupported version {}", state.version),
            });
        }
        Ok(state)
    }

    /// Write state through a sibling temp file and rename
    pub fn save(&self, path: &Path) -> Result<(), TriggerError> {
        let io_err = |e: std::io::Error| TriggerError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| TriggerError::Corrupt {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }

    pub fn evaluate(&self, key: &str, hash: &DefinitionHash) -> TriggerDecision {
        match self.triggers.get(key) {
            Some(record) if &record.hash == hash => TriggerDecision::Skip,
            _ => TriggerDecision::Invoke,
        }
    }

    /// Record an invocation of `key` with `hash`
    pub fn record(&mut self, key: &str, hash: DefinitionHash, at: DateTime<Utc>) {
        let invocations = self.triggers.get(key).map_or(0, |r| r.invocations) + 1;
        info!(key, %hash, invocations, "trigger invocation recorded");
        self.triggers.insert(
            key.to_string(),
            TriggerRecord {
                hash,
                recorded_at: at,
                invocations,
            },
        );
    }
}
