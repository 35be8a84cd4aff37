// Copyright (c) 2025 - Cowboy AI, Inc.
//! Managed Database Descriptor

use serde::Serialize;

use super::invariants::{
    validate_database_name, validate_database_port, validate_master_username,
    validate_non_empty, ValidationResult,
};
use super::{DbIdentifier, RetentionDays};

/// Single PostgreSQL instance settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedDatabase {
    #[serde(rename = "DBInstanceIdentifier")]
    identifier: DbIdentifier,
    #[serde(rename = "DBName")]
    database_name: String,
    engine: &'static str,
    engine_version: String,
    #[serde(rename = "DBInstanceClass")]
    instance_class: String,
    port: u16,
    allocated_storage: u32,
    backup_retention_period: u32,
    deletion_protection: bool,
    #[serde(skip)]
    log_retention: RetentionDays,
    #[serde(skip)]
    master_username: String,
}

impl ManagedDatabase {
    /// PostgreSQL 15.2 on `db.t4g.micro`, database `postgres` on 5432
    pub fn postgres(identifier: DbIdentifier, master_username: impl Into<String>) -> Self {
        Self {
            identifier,
            database_name: "postgres".to_string(),
            engine: "postgres",
            engine_version: "15.2".to_string(),
            instance_class: "db.t4g.micro".to_string(),
            port: 5432,
            allocated_storage: 20,
            backup_retention_period: 0,
            deletion_protection: false,
            log_retention: RetentionDays::OneMonth,
            master_username: master_username.into(),
        }
    }

    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_instance_class(mut self, class: impl Into<String>) -> Self {
        self.instance_class = class.into();
        self
    }

    pub fn validate(&self) -> ValidationResult {
        validate_database_name(&self.database_name)?;
        validate_master_username(&self.master_username)?;
        validate_database_port(self.port)?;
        validate_non_empty("instance class", &self.instance_class)
    }

    pub fn identifier(&self) -> &DbIdentifier {
        &self.identifier
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }

    pub fn instance_class(&self) -> &str {
        &self.instance_class
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn log_retention(&self) -> RetentionDays {
        self.log_retention
    }

    pub fn master_username(&self) -> &str {
        &self.master_username
    }
}
