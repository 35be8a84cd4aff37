// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Units of the pgvector IGDB Demo
//!
//! One module per unit. Each constructor takes its settings and the handles
//! of the units it consumes, and returns the unit together with the handles
//! it publishes. Edges are declared afterwards, in [`app`].
//!
//! ```text
//! network ──► database ──┐            ┌──► inference ──► notebook
//!    │                   ├─► role ────┘
//!    │        storage ───┤
//!    └──────────────────►└─► compute (data load + trigger)
//! ```

pub mod app;
pub mod compute;
pub mod database;
pub mod inference;
pub mod network;
pub mod notebook;
pub mod role;
pub mod storage;

pub use app::{synthesize, JobDefinition, Synthesis};
pub use compute::ComputeStack;
pub use database::DatabaseStack;
pub use inference::InferenceStack;
pub use network::NetworkStack;
pub use notebook::NotebookStack;
pub use role::RoleStack;
pub use storage::StorageStack;

use crate::domain::{NameError, StackName};

/// `"{prefix}-pgvector-igdb-{unit}"`
pub fn unit_name(prefix: &str, unit: &str) -> Result<StackName, NameError> {
    StackName::prefixed(prefix, &format!("pgvector-igdb-{unit}"))
}

/// `database-clients` → `DatabaseClients`
pub(crate) fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
