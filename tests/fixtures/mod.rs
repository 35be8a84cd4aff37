// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for igdb-stacks
//!
//! Deterministic configuration, datasets and in-memory collaborators for the
//! data-load job. Timestamps are fixed; nothing reads the real environment.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use igdb_stacks::config::{DeploymentConfig, JobEnvironment};
use igdb_stacks::loader::{
    AssetStore, DatabaseCredentials, IgdbRow, LoadError, SecretResolver, VectorDatabase,
    VectorSession, DATASET_KEY,
};
use igdb_stacks::state_machine::LoadStep;

pub const SECRET_ARN: &str = "arn:aws:secretsmanager:us-east-1:111122223333:secret:demo-db";
pub const BUCKET: &str = "cdklab-assets";
pub const PASSWORD: &str = "s3cr3t-Passw0rd";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Environment of the documented demo scenario
pub fn demo_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("CDK_DEFAULT_ACCOUNT", "111122223333"),
        ("CDK_DEFAULT_REGION", "us-east-1"),
        ("DB_IDENTIFIER", "demo-db"),
        ("DB_USERNAME", "admin"),
        ("DB_PASSWORD", PASSWORD),
    ]
}

pub fn lookup(pairs: Vec<(&'static str, String)>) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<&str, String> = pairs.into_iter().collect();
    move |key| map.get(key).cloned()
}

/// Asset and job-code directories with minimal contents
pub fn write_local_assets(root: &Path, handler: &str) {
    let assets = root.join("assets");
    let code = root.join("lambda");
    std::fs::create_dir_all(&assets).expect("assets dir");
    std::fs::create_dir_all(&code).expect("lambda dir");
    std::fs::write(assets.join(DATASET_KEY), "[]").expect("dataset");
    std::fs::write(code.join("index.py"), handler).expect("handler");
}

/// Demo configuration with local directories under `root`
pub fn demo_config(root: &Path) -> DeploymentConfig {
    write_local_assets(root, "def handler(event, context):\n    pass\n");
    let mut pairs: Vec<(&'static str, String)> = demo_env()
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();
    pairs.push(("ASSETS_DIR", root.join("assets").display().to_string()));
    pairs.push(("JOB_CODE_DIR", root.join("lambda").display().to_string()));
    DeploymentConfig::from_lookup(lookup(pairs)).expect("demo config")
}

pub fn job_environment() -> JobEnvironment {
    JobEnvironment {
        secret_id: SECRET_ARN.to_string(),
        bucket_name: BUCKET.to_string(),
    }
}

pub fn secret_string() -> String {
    json!({
        "host": "demo-db.abc.us-east-1.rds.amazonaws.com",
        "port": "5432",
        "username": "admin",
        "password": PASSWORD,
        "engine": "postgres",
    })
    .to_string()
}

/// Dataset of `count` rows with `dimension`-wide embeddings
pub fn games_payload(count: usize, dimension: usize) -> Vec<u8> {
    let rows: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let embedding = vec![i as f32 / 10.0; dimension];
            json!([
                i as i64 + 1,
                format!("Game {i}"),
                if i % 2 == 0 { json!(null) } else { json!("A summary") },
                "A description",
                format!("https://www.igdb.com/games/game-{i}"),
                "artwork",
                null,
                embedding,
            ])
        })
        .collect();
    serde_json::to_vec(&rows).expect("payload")
}

// ============================================================================
// In-memory collaborators
// ============================================================================

pub struct FakeSecrets {
    secrets: HashMap<String, String>,
}

impl FakeSecrets {
    pub fn with(secret_id: &str, secret: String) -> Self {
        Self {
            secrets: HashMap::from([(secret_id.to_string(), secret)]),
        }
    }

    pub fn empty() -> Self {
        Self {
            secrets: HashMap::new(),
        }
    }
}

#[async_trait]
impl SecretResolver for FakeSecrets {
    async fn resolve(&self, secret_id: &str) -> Result<DatabaseCredentials, LoadError> {
        let secret = self.secrets.get(secret_id).ok_or_else(|| {
            LoadError::CredentialResolution(format!("secret {secret_id} not found"))
        })?;
        DatabaseCredentials::from_secret_string(secret)
    }
}

pub struct FakeAssets {
    objects: HashMap<(String, String), Vec<u8>>,
}

impl FakeAssets {
    pub fn with_dataset(payload: Vec<u8>) -> Self {
        Self {
            objects: HashMap::from([((BUCKET.to_string(), DATASET_KEY.to_string()), payload)]),
        }
    }

    pub fn empty() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }
}

#[async_trait]
impl AssetStore for FakeAssets {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, LoadError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| LoadError::AssetFetch {
                key: key.to_string(),
                details: "NoSuchKey".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeTable {
    pub dimension: usize,
    pub rows: Vec<IgdbRow>,
    pub indexes: Vec<u32>,
    pub analyzed: bool,
}

/// Observable state of the fake database server
#[derive(Debug, Default)]
pub struct DatabaseState {
    pub connections: usize,
    pub extension: bool,
    pub table: Option<FakeTable>,
}

#[derive(Clone, Default)]
pub struct FakeDatabase {
    pub state: Arc<Mutex<DatabaseState>>,
    pub connect_delay: Option<Duration>,
}

impl FakeDatabase {
    /// Database already holding a table from an earlier load
    pub fn with_existing_table(rows: Vec<IgdbRow>) -> Self {
        let db = Self::default();
        db.state.lock().expect("state").table = Some(FakeTable {
            dimension: 384,
            rows,
            indexes: vec![100],
            analyzed: true,
        });
        db
    }

    pub fn table(&self) -> Option<FakeTable> {
        self.state.lock().expect("state").table.clone()
    }

    pub fn connections(&self) -> usize {
        self.state.lock().expect("state").connections
    }
}

#[async_trait]
impl VectorDatabase for FakeDatabase {
    async fn connect(
        &self,
        credentials: &DatabaseCredentials,
    ) -> Result<Box<dyn VectorSession>, LoadError> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if credentials.password.expose() != PASSWORD {
            return Err(LoadError::Database {
                step: LoadStep::Connect,
                details: "password authentication failed".to_string(),
            });
        }
        self.state.lock().expect("state").connections += 1;
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSession {
    state: Arc<Mutex<DatabaseState>>,
}

impl FakeSession {
    fn with_table<T>(
        &self,
        step: LoadStep,
        f: impl FnOnce(&mut FakeTable) -> T,
    ) -> Result<T, LoadError> {
        let mut state = self.state.lock().expect("state");
        let table = state.table.as_mut().ok_or_else(|| LoadError::Database {
            step,
            details: "relation \"igdb\" does not exist".to_string(),
        })?;
        Ok(f(table))
    }
}

#[async_trait]
impl VectorSession for FakeSession {
    async fn ensure_extension(&mut self) -> Result<(), LoadError> {
        self.state.lock().expect("state").extension = true;
        Ok(())
    }

    async fn recreate_table(&mut self, dimension: usize) -> Result<(), LoadError> {
        self.state.lock().expect("state").table = Some(FakeTable {
            dimension,
            rows: Vec::new(),
            indexes: Vec::new(),
            analyzed: false,
        });
        Ok(())
    }

    async fn insert_rows(&mut self, rows: &[IgdbRow]) -> Result<u64, LoadError> {
        self.with_table(LoadStep::InsertRows, |t| {
            t.rows.extend_from_slice(rows);
            rows.len() as u64
        })
    }

    async fn create_index(&mut self, lists: u32) -> Result<(), LoadError> {
        self.with_table(LoadStep::CreateIndex, |t| t.indexes.push(lists))
    }

    async fn analyze(&mut self) -> Result<(), LoadError> {
        self.with_table(LoadStep::Analyze, |t| t.analyzed = true)
    }
}
