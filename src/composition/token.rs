// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deploy-time Tokens
//!
//! Identifiers such as ARNs and generated names only exist once the
//! provisioning engine has applied a resource. Until then they are carried as
//! tokens: strings of the form `${Token[<stack>/<LogicalId>.<Attribute>]}`
//! that name the owning stack unit. Scanning a unit's properties for tokens
//! owned by other units is how cross-unit references are discovered.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{LogicalId, StackName};

const OPEN: &str = "${Token[";
const CLOSE: &str = "]}";

/// Reference to a resource attribute that resolves at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token {
    owner: StackName,
    logical_id: LogicalId,
    attribute: Option<String>,
}

impl Token {
    /// Reference to the resource itself (its primary identifier)
    pub fn reference(owner: StackName, logical_id: LogicalId) -> Self {
        Self {
            owner,
            logical_id,
            attribute: None,
        }
    }

    /// Reference to a named attribute of the resource
    pub fn attribute(owner: StackName, logical_id: LogicalId, attribute: impl Into<String>) -> Self {
        Self {
            owner,
            logical_id,
            attribute: Some(attribute.into()),
        }
    }

    pub fn owner(&self) -> &StackName {
        &self.owner
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Parse a string that is exactly one token
    pub fn parse(s: &str) -> Option<Self> {
        let inner = s.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
        Self::parse_inner(inner)
    }

    fn parse_inner(inner: &str) -> Option<Self> {
        let (owner, rest) = inner.split_once('/')?;
        let (logical_id, attribute) = match rest.split_once('.') {
            Some((id, attr)) if !attr.is_empty() => (id, Some(attr.to_string())),
            Some(_) => return None,
            None => (rest, None),
        };
        Some(Self {
            owner: StackName::new(owner).ok()?,
            logical_id: LogicalId::new(logical_id).ok()?,
            attribute,
        })
    }

    /// Every well-formed token embedded anywhere in `s`
    pub fn scan(s: &str) -> Vec<Self> {
        let mut tokens = Vec::new();
        let mut rest = s;
        while let Some(start) = rest.find(OPEN) {
            let after = &rest[start + OPEN.len()..];
            match after.find(CLOSE) {
                Some(end) => {
                    if let Some(token) = Self::parse_inner(&after[..end]) {
                        tokens.push(token);
                    }
                    rest = &after[end + CLOSE.len()..];
                }
                None => break,
            }
        }
        tokens
    }

    /// Collect tokens from every string inside a JSON document
    pub fn collect(value: &Value, into: &mut BTreeSet<Token>) {
        match value {
            Value::String(s) => into.extend(Self::scan(s)),
            Value::Array(items) => items.iter().for_each(|v| Self::collect(v, into)),
            Value::Object(map) => {
                for (key, v) in map {
                    into.extend(Self::scan(key));
                    Self::collect(v, into);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{OPEN}{}/{}.{attr}{CLOSE}", self.owner, self.logical_id),
            None => write!(f, "{OPEN}{}/{}{CLOSE}", self.owner, self.logical_id),
        }
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("not a token: {s}")))
    }
}
