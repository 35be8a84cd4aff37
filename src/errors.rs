// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for synthesis and the data-load job

use thiserror::Error;

use crate::access::PolicyError;
use crate::composition::CompositionError;
use crate::config::ConfigError;
use crate::domain::{AssetError, NameError, NetworkError, ValidationError};
use crate::loader::LoadError;
use crate::state_machine::TransitionError;
use crate::trigger::TriggerError;

/// Errors that can occur while synthesizing or running the stacks
#[derive(Debug, Error)]
pub enum StackError {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid stack, resource or database name
    #[error("Name error: {0}")]
    Name(#[from] NameError),

    /// Invalid network topology
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Resource descriptor violates an invariant
    #[error("Invalid resource: {0}")]
    Validation(#[from] ValidationError),

    /// Local asset directory could not be packaged
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Grant rejected
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Dependency graph rejected
    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    /// Deployment state unreadable or unwritable
    #[error("Trigger state error: {0}")]
    Trigger(#[from] TriggerError),

    /// Data-load job step failed
    #[error("Data load failed: {0}")]
    Load(#[from] LoadError),

    /// Invalid state transition
    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;

impl From<serde_json::Error> for StackError {
    fn from(err: serde_json::Error) -> Self {
        StackError::Serialization(err.to_string())
    }
}
