// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Composition
//!
//! Assembles stack units into one deployment graph:
//!
//! ```text
//! StackUnit (no edges) → CompositionBuilder (edges, groups) → build() → DeploymentPlan
//! ```
//!
//! Cross-unit references are discovered from the tokens a unit embeds, so a
//! reference without a matching edge is caught at synthesis time rather than
//! by the provisioning engine.

pub mod graph;
pub mod plan;
pub mod token;
pub mod unit;

pub use graph::{CompositionBuilder, CompositionError, DependencyGroup};
pub use plan::{DeploymentPlan, PlanDocument, ResourceDocument, UnitDocument};
pub use token::Token;
pub use unit::{Output, OutputRef, Parameter, Resource, ResourceRef, StackUnit};
