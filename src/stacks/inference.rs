// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inference Stack: embedding model behind a serverless endpoint
//!
//! Model and endpoint configuration carry the set's revision in their
//! logical ids, so a changed definition declares new resources and the
//! engine swaps the endpoint over instead of updating in place.

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::composition::{ResourceRef, StackUnit, Token};
use crate::domain::{InferenceEndpoint, ModelSpec, ResourceType, ServerlessConfig, StackName};
use crate::errors::StackResult;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModelProperties<'a> {
    execution_role_arn: Token,
    primary_container: &'a ModelSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ProductionVariant {
    model_name: Token,
    variant_name: &'static str,
    serverless_config: ServerlessConfig,
}

/// Inference unit plus the endpoint handle
#[derive(Debug, Clone)]
pub struct InferenceStack {
    pub unit: StackUnit,
    endpoint: ResourceRef,
    revision: String,
}

impl InferenceStack {
    pub fn new(
        name: StackName,
        endpoint_name: &str,
        definition: &InferenceEndpoint,
        role_arn: Token,
    ) -> StackResult<Self> {
        definition.validate()?;
        let revision = definition.revision()?;
        let mut unit = StackUnit::new(name, "CDK Lab pgvector IGDB Inference Stack");

        let model = unit.add_resource(
            &format!("EmbeddingModel{revision}"),
            ResourceType::Model,
            &ModelProperties {
                execution_role_arn: role_arn,
                primary_container: definition.model(),
            },
        )?;
        let variants = [ProductionVariant {
            model_name: model.attr("ModelName"),
            variant_name: "AllTraffic",
            serverless_config: definition.serverless(),
        }];
        let config = unit.add_resource(
            &format!("EmbeddingEndpointConfig{revision}"),
            ResourceType::EndpointConfig,
            &json!({ "ProductionVariants": variants }),
        )?;
        let endpoint = unit.add_resource(
            "EmbeddingEndpoint",
            ResourceType::Endpoint,
            &json!({
                "EndpointName": endpoint_name,
                "EndpointConfigName": config.attr("EndpointConfigName"),
            }),
        )?;

        unit.add_output("EndpointName", endpoint.attr("EndpointName"))?;

        debug!(%revision, endpoint = endpoint_name, "inference stack declared");
        Ok(Self {
            unit,
            endpoint,
            revision,
        })
    }

    pub fn endpoint_name(&self) -> Token {
        self.endpoint.attr("EndpointName")
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }
}
