// Copyright (c) 2025 - Cowboy AI, Inc.
//! Data-Load Job
//!
//! Loads the IGDB embedding dataset from the assets bucket into the
//! pgvector table. Invoked once after a deployment whose job definition
//! changed.
//!
//! Run with: cargo run --bin igdb-data-load
//!
//! Prerequisites:
//! 1. `DB_SECRET_ARN` naming the database secret
//! 2. `BUCKET_NAME` naming the assets bucket
//! 3. AWS credentials able to read both

use anyhow::{Context, Result};
use igdb_stacks::config::JobEnvironment;
use igdb_stacks::loader::aws::{S3AssetStore, SecretsManagerResolver};
use igdb_stacks::loader::postgres::PgVectorDatabase;
use igdb_stacks::DataLoadJob;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let environment = JobEnvironment::from_env().context("Job environment incomplete")?;
    info!(bucket = %environment.bucket_name, "starting data load");

    let sdk = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let job = DataLoadJob::new(
        environment,
        SecretsManagerResolver::new(&sdk),
        S3AssetStore::new(&sdk),
        PgVectorDatabase,
    );

    match job.run().await {
        Ok(rows) => {
            info!(rows, "process finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "data load failed");
            Err(e.into())
        }
    }
}
