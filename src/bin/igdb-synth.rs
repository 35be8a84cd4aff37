// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Synthesizer
//!
//! Builds and validates the deployment plan, writes it as JSON and reports
//! whether the data-load trigger fires for this deployment.
//!
//! Run with: cargo run --bin igdb-synth -- --prefix cdklab --out plan.json
//!
//! Prerequisites: `DB_IDENTIFIER`, `DB_USERNAME` and `DB_PASSWORD` in the
//! environment or a `.env` file.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use igdb_stacks::config::{load_env_file, write_private_file, DeploymentConfig};
use igdb_stacks::{synthesize, DeploymentState, TriggerDecision};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "igdb-synth", about = "Synthesize the pgvector IGDB stacks")]
struct Args {
    /// Naming prefix for every unit (overrides STACK_PREFIX)
    #[arg(long)]
    prefix: Option<String>,

    /// Explicit .env file; defaults to ./.env when present
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Deployment state file used for trigger decisions
    #[arg(long, default_value = "deployment-state.json")]
    state: PathBuf,

    /// Plan output; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write deploy-time parameter values here for the provisioning engine
    #[arg(long)]
    parameters_out: Option<PathBuf>,

    /// Record the trigger invocation in the state file
    #[arg(long)]
    record: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Some(found) = load_env_file(args.env_file.as_deref())? {
        info!(path = %found.display(), "loaded env file");
    }
    let mut config = DeploymentConfig::from_env()?;
    if let Some(prefix) = args.prefix {
        config = config.with_prefix(prefix)?;
    }

    let synthesis = synthesize(&config).context("Synthesis failed")?;
    for (i, stage) in synthesis.plan.stages().iter().enumerate() {
        let names: Vec<&str> = stage.iter().map(|n| n.as_str()).collect();
        info!(stage = i, units = ?names, "deployment stage");
    }

    let parameters = synthesis
        .deploy_parameters(&config)
        .context("Deploy-time parameters unresolved")?;
    if let Some(path) = &args.parameters_out {
        write_private_file(path, &serde_json::to_string_pretty(&parameters)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), count = parameters.len(), "deploy parameters written");
    }

    let plan = synthesis.plan.to_json_pretty()?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &plan)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "plan written");
        }
        None => println!("{plan}"),
    }

    let mut state = DeploymentState::load(&args.state)?;
    match state.evaluate(&synthesis.job.key, &synthesis.job.hash) {
        TriggerDecision::Invoke => {
            info!(job = %synthesis.job.key, hash = %synthesis.job.hash, "data load will run after deployment");
            if args.record {
                state.record(&synthesis.job.key, synthesis.job.hash.clone(), Utc::now());
                state.save(&args.state)?;
            }
        }
        TriggerDecision::Skip => {
            info!(job = %synthesis.job.key, "job definition unchanged; data load skipped");
        }
    }

    if args.parameters_out.is_none() && !parameters.is_empty() {
        warn!("deploy-time parameters must be supplied to the provisioning engine");
    }
    Ok(())
}
