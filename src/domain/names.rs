// Copyright (c) 2025 - Cowboy AI, Inc.
//! Name Value Objects with Provider Naming Invariants
//!
//! Stack names, logical resource identifiers and database identifiers each
//! follow the control plane's own naming rules. Validating them at
//! construction keeps malformed names out of a synthesized plan.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("{kind} is empty")]
    Empty { kind: &'static str },

    #[error("{kind} exceeds maximum length of {max} characters: {len}")]
    TooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Invalid character {ch:?} in {kind}: {name}")]
    InvalidCharacter {
        kind: &'static str,
        ch: char,
        name: String,
    },

    #[error("{kind} must start with a letter: {name}")]
    MustStartWithLetter { kind: &'static str, name: String },

    #[error("{kind} cannot end with a hyphen or contain consecutive hyphens: {name}")]
    InvalidHyphenation { kind: &'static str, name: String },
}

fn check_length(kind: &'static str, name: &str, max: usize) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty { kind });
    }
    if name.len() > max {
        return Err(NameError::TooLong {
            kind,
            len: name.len(),
            max,
        });
    }
    Ok(())
}

fn check_leading_letter(kind: &'static str, name: &str) -> Result<(), NameError> {
    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => Ok(()),
        _ => Err(NameError::MustStartWithLetter {
            kind,
            name: name.to_string(),
        }),
    }
}

fn check_charset(
    kind: &'static str,
    name: &str,
    allowed: impl Fn(char) -> bool,
) -> Result<(), NameError> {
    match name.chars().find(|c| !allowed(*c)) {
        Some(ch) => Err(NameError::InvalidCharacter {
            kind,
            ch,
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

/// Deployable stack name
///
/// Invariants:
/// - 1 to 128 characters
/// - Starts with an ASCII letter
/// - Only ASCII letters, digits and hyphens
///
/// # Examples
///
/// ```rust
/// use igdb_stacks::domain::StackName;
///
/// let name = StackName::new("demo-pgvector-igdb-vpc").unwrap();
/// assert_eq!(name.as_str(), "demo-pgvector-igdb-vpc");
///
/// assert!(StackName::new("").is_err());
/// assert!(StackName::new("1-stack").is_err());
/// assert!(StackName::new("stack_name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StackName(String);

impl StackName {
    /// Maximum stack name length
    pub const MAX_LENGTH: usize = 128;

    const KIND: &'static str = "Stack name";

    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        check_length(Self::KIND, &name, Self::MAX_LENGTH)?;
        check_leading_letter(Self::KIND, &name)?;
        check_charset(Self::KIND, &name, |c| c.is_ascii_alphanumeric() || c == '-')?;
        Ok(Self(name))
    }

    /// Compose `"{prefix}-{suffix}"` and validate the result
    pub fn prefixed(prefix: &str, suffix: &str) -> Result<Self, NameError> {
        Self::new(format!("{prefix}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StackName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StackName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StackName> for String {
    fn from(name: StackName) -> Self {
        name.0
    }
}

/// Logical identifier of a resource inside one stack
///
/// Invariants:
/// - 1 to 255 characters
/// - ASCII alphanumeric only
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalId(String);

impl LogicalId {
    pub const MAX_LENGTH: usize = 255;

    const KIND: &'static str = "Logical id";

    pub fn new(id: impl Into<String>) -> Result<Self, NameError> {
        let id = id.into();
        check_length(Self::KIND, &id, Self::MAX_LENGTH)?;
        check_charset(Self::KIND, &id, |c| c.is_ascii_alphanumeric())?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LogicalId {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogicalId> for String {
    fn from(id: LogicalId) -> Self {
        id.0
    }
}

/// Managed database instance identifier
///
/// Invariants:
/// - 1 to 63 characters
/// - Starts with a letter
/// - Lowercase letters, digits and hyphens
/// - No trailing hyphen, no two consecutive hyphens
///
/// Uppercase input is folded to lowercase, matching how the control plane
/// stores identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DbIdentifier(String);

impl DbIdentifier {
    pub const MAX_LENGTH: usize = 63;

    const KIND: &'static str = "Database identifier";

    pub fn new(identifier: impl Into<String>) -> Result<Self, NameError> {
        let identifier = identifier.into().to_ascii_lowercase();
        check_length(Self::KIND, &identifier, Self::MAX_LENGTH)?;
        check_leading_letter(Self::KIND, &identifier)?;
        check_charset(Self::KIND, &identifier, |c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
        })?;
        if identifier.ends_with('-') || identifier.contains("--") {
            return Err(NameError::InvalidHyphenation {
                kind: Self::KIND,
                name: identifier,
            });
        }
        Ok(Self(identifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DbIdentifier {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DbIdentifier> for String {
    fn from(id: DbIdentifier) -> Self {
        id.0
    }
}
