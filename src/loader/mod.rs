// Copyright (c) 2025 - Cowboy AI, Inc.
//! Data-Load Job
//!
//! Loads the game dataset from the assets bucket into the vector database.
//! One invocation runs a fixed, sequential protocol:
//!
//! ```text
//! resolve credentials → fetch dataset → parse payload → connect
//!   → drop + create table → insert rows (one transaction)
//!   → ivfflat cosine index → VACUUM ANALYZE
//! ```
//!
//! The payload is fully parsed and validated before the first connection, so
//! a bad secret, a missing object or a malformed payload never touches the
//! database. Every run replaces the table, which makes reruns idempotent.
//!
//! External systems sit behind [`SecretResolver`], [`AssetStore`] and
//! [`VectorDatabase`]. The AWS and PostgreSQL adapters are feature-gated.

pub mod credentials;
pub mod payload;
pub mod sql;

#[cfg(feature = "aws")]
pub mod aws;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigError, JobEnvironment};
use crate::state_machine::{
    LoadCommand, LoadStage, LoadStep, Tracked, TransitionError,
};

pub use credentials::DatabaseCredentials;
pub use payload::{parse_payload, IgdbRow};

/// Object key of the dataset in the assets bucket
pub const DATASET_KEY: &str = "nintendo_switch_games_mean_pooling.json";

/// Embedding width of the dataset
pub const EMBEDDING_DIMENSION: usize = 384;

pub const DEFAULT_IVFFLAT_LISTS: u32 = 100;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that end a job run
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Job environment incomplete: {0}")]
    MissingEnvironment(#[from] ConfigError),

    #[error("Could not resolve database credentials: {0}")]
    CredentialResolution(String),

    #[error("Could not fetch '{key}': {details}")]
    AssetFetch { key: String, details: String },

    #[error("Malformed dataset payload: {0}")]
    PayloadParse(String),

    #[error("Database error during {step}: {details}")]
    Database { step: LoadStep, details: String },

    #[error("{step} timed out after {seconds}s")]
    Timeout { step: LoadStep, seconds: u64 },

    #[error("Progress tracking failed: {0}")]
    Progress(#[from] TransitionError),
}

/// Resolves the database secret into connection credentials
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, secret_id: &str) -> Result<DatabaseCredentials, LoadError>;
}

/// Fetches the dataset object
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, LoadError>;
}

/// Opens sessions on the target database
#[async_trait]
pub trait VectorDatabase: Send + Sync {
    async fn connect(
        &self,
        credentials: &DatabaseCredentials,
    ) -> Result<Box<dyn VectorSession>, LoadError>;
}

/// One open connection to the target database
#[async_trait]
pub trait VectorSession: Send {
    /// `CREATE EXTENSION IF NOT EXISTS vector`
    async fn ensure_extension(&mut self) -> Result<(), LoadError>;

    /// Drop and recreate the table with an embedding column of `dimension`
    async fn recreate_table(&mut self, dimension: usize) -> Result<(), LoadError>;

    /// Insert every row in a single transaction
    async fn insert_rows(&mut self, rows: &[IgdbRow]) -> Result<u64, LoadError>;

    async fn create_index(&mut self, lists: u32) -> Result<(), LoadError>;

    async fn analyze(&mut self) -> Result<(), LoadError>;
}

/// Tunables of a job run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    pub object_key: String,
    pub dimension: usize,
    pub ivfflat_lists: u32,
    pub connect_timeout: Duration,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            object_key: DATASET_KEY.to_string(),
            dimension: EMBEDDING_DIMENSION,
            ivfflat_lists: DEFAULT_IVFFLAT_LISTS,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

pub type LoadProgress = Tracked<LoadStage>;

/// The data-load job, wired to its collaborators
pub struct DataLoadJob<S, A, D> {
    environment: JobEnvironment,
    secrets: S,
    assets: A,
    database: D,
    settings: LoadSettings,
}

impl<S, A, D> DataLoadJob<S, A, D>
where
    S: SecretResolver,
    A: AssetStore,
    D: VectorDatabase,
{
    pub fn new(environment: JobEnvironment, secrets: S, assets: A, database: D) -> Self {
        Self {
            environment,
            secrets,
            assets,
            database,
            settings: LoadSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: LoadSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &LoadSettings {
        &self.settings
    }

    /// Run once with a fresh progress tracker; returns the number of rows loaded
    pub async fn run(&self) -> Result<u64, LoadError> {
        let mut progress = LoadProgress::new(LoadStage::Pending);
        let result = self.run_tracked(&mut progress).await;
        info!(
            stage = ?progress.current(),
            transitions = progress.history().len(),
            "data load run ended"
        );
        result
    }

    /// Run once, recording every stage change in `progress`
    pub async fn run_tracked(&self, progress: &mut LoadProgress) -> Result<u64, LoadError> {
        let env = &self.environment;
        let settings = &self.settings;

        let credentials = tracked(
            progress,
            LoadStep::ResolveCredentials,
            self.secrets.resolve(&env.secret_id),
        )
        .await?;

        let bytes = tracked(
            progress,
            LoadStep::FetchAsset,
            self.assets.fetch(&env.bucket_name, &settings.object_key),
        )
        .await?;

        let rows = tracked(progress, LoadStep::ParsePayload, async {
            parse_payload(&bytes, settings.dimension)
        })
        .await?;
        info!(rows = rows.len(), "payload parsed");

        let mut session = tracked(progress, LoadStep::Connect, async {
            let mut session =
                match tokio::time::timeout(settings.connect_timeout, self.database.connect(&credentials))
                    .await
                {
                    Ok(session) => session?,
                    Err(_) => {
                        return Err(LoadError::Timeout {
                            step: LoadStep::Connect,
                            seconds: settings.connect_timeout.as_secs(),
                        })
                    }
                };
            session.ensure_extension().await?;
            Ok(session)
        })
        .await?;

        tracked(
            progress,
            LoadStep::RecreateTable,
            session.recreate_table(settings.dimension),
        )
        .await?;
        let inserted = tracked(progress, LoadStep::InsertRows, session.insert_rows(&rows)).await?;
        tracked(
            progress,
            LoadStep::CreateIndex,
            session.create_index(settings.ivfflat_lists),
        )
        .await?;
        tracked(progress, LoadStep::Analyze, session.analyze()).await?;

        progress.apply(LoadCommand::Finish, Utc::now())?;
        info!(rows = inserted, "data load finished");
        Ok(inserted)
    }
}

async fn tracked<T, F>(progress: &mut LoadProgress, step: LoadStep, work: F) -> Result<T, LoadError>
where
    F: Future<Output = Result<T, LoadError>>,
{
    info!(%step, "load step started");
    match work.await {
        Ok(value) => {
            progress.apply(LoadCommand::Complete(step), Utc::now())?;
            Ok(value)
        }
        Err(err) => {
            error!(%step, error = %err, "load step failed");
            if let Err(e) = progress.apply(LoadCommand::Fail(step), Utc::now()) {
                warn!(%step, error = %e, "failure not recorded");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_records_success_and_failure() {
        let mut progress = LoadProgress::new(LoadStage::Pending);
        let value = tokio_test::block_on(tracked(
            &mut progress,
            LoadStep::ResolveCredentials,
            async { Ok::<_, LoadError>(7) },
        ))
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(*progress.current(), LoadStage::CredentialsResolved);

        let err = tokio_test::block_on(tracked(&mut progress, LoadStep::FetchAsset, async {
            Err::<(), _>(LoadError::AssetFetch {
                key: DATASET_KEY.to_string(),
                details: "NoSuchKey".to_string(),
            })
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::AssetFetch { .. }));
        assert_eq!(
            *progress.current(),
            LoadStage::Failed(LoadStep::FetchAsset)
        );
        assert_eq!(progress.history().len(), 2);
    }

    #[test]
    fn test_out_of_order_step_is_a_progress_error() {
        let mut progress = LoadProgress::new(LoadStage::Pending);
        let err = tokio_test::block_on(tracked(&mut progress, LoadStep::Connect, async {
            Ok::<_, LoadError>(())
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::Progress(_)));
        assert_eq!(*progress.current(), LoadStage::Pending);
    }

    #[test]
    fn test_default_settings() {
        let settings = LoadSettings::default();
        assert_eq!(settings.object_key, "nintendo_switch_games_mean_pooling.json");
        assert_eq!(settings.dimension, 384);
        assert_eq!(settings.ivfflat_lists, 100);
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
    }
}
