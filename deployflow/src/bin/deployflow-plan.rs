//! Prints the model-deploy plan for one configured environment.

use anyhow::{Context, Result};
use clap::Parser;
use deployflow::blueprints::model_deploy_composition_with_policy;
use deployflow::config::ComposerConfig;
use deployflow::events::LoggingEventSink;
use deployflow::observability::{init_tracing, LogFormat};
use std::path::PathBuf;
use std::sync::Arc;

/// Compose the model-deploy application and print its deployment plan.
#[derive(Debug, Parser)]
#[command(name = "deployflow-plan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the composer config (JSON)
    config: PathBuf,

    /// Name of the environment to compose
    environment: String,

    /// Log output format
    #[arg(long, env = "DEPLOYFLOW_LOG_FORMAT", value_enum, default_value_t)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = ComposerConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    config.apply_env_overrides();
    let env = config.environment(&cli.environment)?;

    let mut app = model_deploy_composition_with_policy(env, config.policy)?
        .with_event_sink(Arc::new(LoggingEventSink::debug()));
    let plan = app
        .compose()
        .with_context(|| format!("failed to compose environment '{}'", cli.environment))?;

    println!("{}", plan.to_json_pretty()?);
    Ok(())
}
