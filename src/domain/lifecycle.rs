// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource lifecycle settings shared by every descriptor

use serde::{Deserialize, Serialize};

/// What happens to a resource when its stack unit is torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RemovalPolicy {
    /// Delete the resource (and, for buckets, its contents)
    Destroy,
    /// Leave the resource behind
    #[default]
    Retain,
    /// Delete after taking a final snapshot
    Snapshot,
}

/// Log retention period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionDays {
    OneDay,
    OneWeek,
    OneMonth,
    ThreeMonths,
    OneYear,
}

impl RetentionDays {
    pub fn days(&self) -> u32 {
        match self {
            Self::OneDay => 1,
            Self::OneWeek => 7,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::OneYear => 365,
        }
    }
}
