// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Units
//!
//! A stack unit is a named, independently deployable bundle of resource
//! descriptors and outputs. Units carry no dependency edges of their own;
//! edges are declared afterwards by [`CompositionBuilder`](super::CompositionBuilder).

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::{CompositionError, Token};
use crate::domain::{LogicalId, RemovalPolicy, ResourceType, StackName};

/// One resource declaration inside a unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    logical_id: LogicalId,
    kind: ResourceType,
    properties: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    removal_policy: Option<RemovalPolicy>,
}

impl Resource {
    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    pub fn properties(&self) -> &Value {
        &self.properties
    }

    pub fn removal_policy(&self) -> Option<RemovalPolicy> {
        self.removal_policy
    }
}

/// Handle to a resource declared in some unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    stack: StackName,
    logical_id: LogicalId,
    kind: ResourceType,
}

impl ResourceRef {
    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    /// Token for the resource's primary identifier
    pub fn reference(&self) -> Token {
        Token::reference(self.stack.clone(), self.logical_id.clone())
    }

    /// Token for a named attribute (`Arn`, `Name`, ...)
    pub fn attr(&self, attribute: &str) -> Token {
        Token::attribute(self.stack.clone(), self.logical_id.clone(), attribute)
    }
}

/// Named value a unit publishes for others
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub value: String,
}

/// Handle to a published output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRef {
    stack: StackName,
    key: String,
    value: String,
}

impl OutputRef {
    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The output value as a consumer embeds it
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Deploy-time input; the plan carries the declaration, never the value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    pub description: String,
    pub no_echo: bool,
}

/// Named, independently deployable bundle of resource descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct StackUnit {
    name: StackName,
    description: String,
    parameters: BTreeMap<String, Parameter>,
    resources: Vec<Resource>,
    outputs: BTreeMap<String, Output>,
}

impl StackUnit {
    pub fn new(name: StackName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            parameters: BTreeMap::new(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &StackName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.logical_id.as_str() == logical_id)
    }

    pub fn resources_of(&self, kind: ResourceType) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    pub fn parameters(&self) -> &BTreeMap<String, Parameter> {
        &self.parameters
    }

    /// Declare a deploy-time parameter; returns the placeholder to embed
    pub fn add_parameter(
        &mut self,
        name: &str,
        description: impl Into<String>,
        no_echo: bool,
    ) -> Result<String, CompositionError> {
        let id = LogicalId::new(name)?;
        if self.parameters.contains_key(id.as_str()) {
            return Err(CompositionError::DuplicateParameter {
                stack: self.name.clone(),
                name: id.to_string(),
            });
        }
        self.parameters.insert(
            id.to_string(),
            Parameter {
                description: description.into(),
                no_echo,
            },
        );
        Ok(format!("{{{{param:{id}}}}}"))
    }

    /// Declare a resource from any serializable descriptor
    pub fn add_resource<T: Serialize>(
        &mut self,
        logical_id: &str,
        kind: ResourceType,
        properties: &T,
    ) -> Result<ResourceRef, CompositionError> {
        self.push_resource(logical_id, kind, properties, None)
    }

    /// Declare a resource with an explicit removal policy
    pub fn add_resource_with_removal<T: Serialize>(
        &mut self,
        logical_id: &str,
        kind: ResourceType,
        properties: &T,
        removal_policy: RemovalPolicy,
    ) -> Result<ResourceRef, CompositionError> {
        self.push_resource(logical_id, kind, properties, Some(removal_policy))
    }

    fn push_resource<T: Serialize>(
        &mut self,
        logical_id: &str,
        kind: ResourceType,
        properties: &T,
        removal_policy: Option<RemovalPolicy>,
    ) -> Result<ResourceRef, CompositionError> {
        let logical_id = LogicalId::new(logical_id)?;
        if self.resources.iter().any(|r| r.logical_id == logical_id) {
            return Err(CompositionError::DuplicateLogicalId {
                stack: self.name.clone(),
                logical_id,
            });
        }
        let properties = serde_json::to_value(properties)
            .map_err(|e| CompositionError::Serialization(e.to_string()))?;

        self.resources.push(Resource {
            logical_id: logical_id.clone(),
            kind,
            properties,
            removal_policy,
        });

        Ok(ResourceRef {
            stack: self.name.clone(),
            logical_id,
            kind,
        })
    }

    /// Publish a value under `key`
    pub fn add_output(
        &mut self,
        key: &str,
        value: impl ToString,
    ) -> Result<OutputRef, CompositionError> {
        let value = value.to_string();
        if self.outputs.contains_key(key) {
            return Err(CompositionError::DuplicateOutput {
                stack: self.name.clone(),
                key: key.to_string(),
            });
        }
        self.outputs.insert(
            key.to_string(),
            Output {
                value: value.clone(),
            },
        );
        Ok(OutputRef {
            stack: self.name.clone(),
            key: key.to_string(),
            value,
        })
    }

    /// Every token appearing in resources or outputs
    pub fn tokens(&self) -> BTreeSet<Token> {
        let mut tokens = BTreeSet::new();
        for resource in &self.resources {
            Token::collect(&resource.properties, &mut tokens);
        }
        for output in self.outputs.values() {
            tokens.extend(Token::scan(&output.value));
        }
        tokens
    }

    /// Tokens owned by other units, i.e. this unit's imports
    pub fn imports(&self) -> BTreeSet<Token> {
        self.tokens()
            .into_iter()
            .filter(|t| t.owner() != &self.name)
            .collect()
    }

    /// Names of the units whose outputs this unit consumes
    pub fn references(&self) -> BTreeSet<StackName> {
        self.imports().into_iter().map(|t| t.owner().clone()).collect()
    }
}
