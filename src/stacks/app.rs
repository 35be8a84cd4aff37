// Copyright (c) 2025 - Cowboy AI, Inc.
//! Top-Level Composition
//!
//! Declares every unit from one [`DeploymentConfig`], then declares all
//! edges in a single assembly pass and validates the graph. Nothing is
//! returned unless the whole plan is valid.

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{
    unit_name, ComputeStack, DatabaseStack, InferenceStack, NetworkStack, NotebookStack,
    RoleStack, StorageStack,
};
use crate::composition::{CompositionBuilder, DeploymentPlan};
use crate::config::{ConfigError, DeploymentConfig};
use crate::domain::{
    AssetSource, AssetUpload, DefinitionHash, InferenceEndpoint, ManagedDatabase, ModelSpec,
    NotebookInstance, ServerlessConfig, StorageBucket,
};
use crate::errors::StackResult;

/// Name of the data-storage dependency group
pub const DATA_GROUP: &str = "data";

/// Trigger-relevant identity of the data-load job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    /// Stable key: `"{unit}/{function}"`
    pub key: String,
    pub hash: DefinitionHash,
}

/// Validated plan plus the job definition to compare against deployment state
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub plan: DeploymentPlan,
    pub job: JobDefinition,
}

impl Synthesis {
    /// Values for every deploy-time parameter the plan declares
    ///
    /// Keys are `"{unit}.{parameter}"`.
    pub fn deploy_parameters(
        &self,
        config: &DeploymentConfig,
    ) -> Result<BTreeMap<String, String>, ConfigError> {
        self.plan
            .parameters()
            .map(|(unit, name, _)| {
                config
                    .parameter_value(name)
                    .map(|value| (format!("{unit}.{name}"), value.expose().to_string()))
                    .ok_or_else(|| ConfigError::UnboundParameter(name.to_string()))
            })
            .collect()
    }
}

/// Declare, wire and validate every unit
pub fn synthesize(config: &DeploymentConfig) -> StackResult<Synthesis> {
    let prefix = config.prefix.as_str();

    let network = NetworkStack::new(
        unit_name(prefix, "vpc")?,
        super::network::demo_topology(&config.region)?,
    )?;

    let database = DatabaseStack::new(
        unit_name(prefix, config.database.identifier.as_str())?,
        &ManagedDatabase::postgres(
            config.database.identifier.clone(),
            config.database.username.clone(),
        ),
        &network,
    )?;

    let storage = StorageStack::new(
        unit_name(prefix, "s3")?,
        &StorageBucket::ephemeral(),
        &AssetUpload::new(AssetSource::from_dir(&config.assets_dir)?),
    )?;

    let compute = ComputeStack::new(
        unit_name(prefix, "lambda")?,
        AssetSource::from_dir(&config.job_code_dir)?,
        &network,
        database.secret(),
        &storage,
    )?;

    let role = RoleStack::new(unit_name(prefix, "iam")?, prefix, &database, &storage)?;

    let mut model = ModelSpec::feature_extraction(
        config.inference.image_uri.clone(),
        config.inference.model_id.clone(),
    );
    if let Some(url) = &config.inference.model_data_url {
        model = model.with_model_data(url.clone());
    }
    let inference = InferenceStack::new(
        unit_name(prefix, "inference")?,
        &format!("{prefix}-igdb-embeddings"),
        &InferenceEndpoint::new(
            model,
            ServerlessConfig {
                memory_mib: config.inference.memory_mib,
                max_concurrency: config.inference.max_concurrency,
            },
        ),
        role.role_arn(),
    )?;

    let notebook = NotebookStack::new(
        unit_name(prefix, "notebook")?,
        &NotebookInstance::new(config.notebook_repository.clone()),
        &network,
        &storage,
        &role,
        &inference,
    )?;

    let job = JobDefinition {
        key: format!("{}/{}", compute.unit.name(), compute.function().logical_id()),
        hash: compute.definition_hash().clone(),
    };

    let net = network.unit.name().clone();
    let db = database.unit.name().clone();
    let s3 = storage.unit.name().clone();
    let lambda = compute.unit.name().clone();
    let iam = role.unit.name().clone();
    let ml = inference.unit.name().clone();
    let nb = notebook.unit.name().clone();

    let mut builder = CompositionBuilder::new();
    builder
        .add_unit(network.unit)?
        .add_unit(database.unit)?
        .add_unit(storage.unit)?
        .add_unit(compute.unit)?
        .add_unit(role.unit)?
        .add_unit(inference.unit)?
        .add_unit(notebook.unit)?;

    builder.depends_on(&db, &net)?;
    let data = builder.group(DATA_GROUP, &[&db, &s3])?;
    builder
        .depends_on(&lambda, &net)?
        .depends_on_group(&lambda, &data)?
        .depends_on_group(&iam, &data)?
        .depends_on(&ml, &iam)?
        .depends_on(&nb, &ml)?
        .depends_on(&nb, &net)?
        .depends_on(&nb, &iam)?
        .depends_on(&nb, &s3)?;

    let plan = builder.build()?;
    debug!(stages = plan.stages().len(), "dependency graph validated");
    info!(units = plan.units().count(), job = %job.key, "synthesis complete");
    Ok(Synthesis { plan, job })
}
