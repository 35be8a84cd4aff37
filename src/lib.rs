// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment stacks for the pgvector IGDB demo
//!
//! Declares the demo's infrastructure as independently deployable units,
//! validates the dependency graph between them before anything is emitted,
//! confines the database credential to one owner plus scoped grants, decides
//! when the post-deployment data load must run, and implements that load.
//!
//! # Modules
//!
//! - [`domain`]: validated value objects (names, network, resources)
//! - [`access`]: execution roles, grants and the secret capability
//! - [`composition`]: stack units, output tokens and the dependency graph
//! - [`stacks`]: the seven concrete units and top-level synthesis
//! - [`trigger`]: definition-hash trigger state
//! - [`loader`]: the data-load job
//! - [`state_machine`]: generic FSM traits and the load progress machine

pub mod access;
pub mod composition;
pub mod config;
pub mod domain;
pub mod errors;
pub mod loader;
pub mod stacks;
pub mod state_machine;
pub mod trigger;

// Re-export commonly used types
pub use composition::{CompositionBuilder, CompositionError, DeploymentPlan, StackUnit, Token};
pub use config::{ConfigError, DeploymentConfig, JobEnvironment, Sensitive};
pub use errors::{StackError, StackResult};
pub use loader::{DataLoadJob, LoadError};
pub use stacks::{synthesize, JobDefinition, Synthesis};
pub use trigger::{DeploymentState, TriggerDecision, TriggerError};
