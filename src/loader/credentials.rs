// Copyright (c) 2025 - Cowboy AI, Inc.
//! Database credentials resolved from the secret payload

use serde::{Deserialize, Deserializer};
use std::fmt;

use super::LoadError;
use crate::config::Sensitive;

/// Connection credentials read from the database secret
///
/// The secret carries more keys (engine, instance identifier); only the
/// connection fields are kept.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseCredentials {
    pub host: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
    pub username: String,
    pub password: Sensitive,
    /// Absent in instance-attached secrets; the server then uses the
    /// username as the database name
    #[serde(default)]
    pub dbname: Option<String>,
}

impl DatabaseCredentials {
    /// Parse the secret string
    pub fn from_secret_string(secret: &str) -> Result<Self, LoadError> {
        serde_json::from_str(secret)
            .map_err(|e| LoadError::CredentialResolution(format!("malformed secret payload: {e}")))
    }
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("dbname", &self.dbname)
            .finish()
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{text}'"))),
    }
}
