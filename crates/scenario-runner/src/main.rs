//! Scenario runner entry point for the lending scenario harness.
//!
//! Loads configuration, restores the network's saved deployments, and
//! applies scenario events one at a time.
//!
//! # Architecture
//!
//! ```text
//! event text --> parse --> namespace router --> fetcher dispatch --> Chain
//!                                                       |
//!                     NetworkStore <-- World + event log <-+
//! ```
//!
//! The process exits non-zero if any event fails; later events are not run.

mod cli;
mod error;
mod runner;

use anyhow::Context as _;
use clap::Parser;
use scenario_core::{Context, LogFormat, ScenarioConfig};
use scenario_db::NetworkStore;
use scenario_world::World;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::runner::ScenarioRunner;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, artifact loading, persistence, or any
/// scenario event fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ScenarioConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    init_tracing(&config.logging.level, config.logging.format);
    info!("scenario-runner starting");
    info!(
        network = config.network.name,
        from = %config.network.from,
        strict_catchall = config.dispatch.strict_catchall,
        persistence = config.persistence.enabled,
        seed = config.dev_chain.seed,
        "configuration loaded"
    );

    let ctx = Context::development(&config)?;
    info!(
        artifacts = ctx.artifacts().names().count(),
        "artifact registry loaded"
    );

    let store = config
        .persistence
        .enabled
        .then(|| NetworkStore::new(&config.persistence.networks_dir));
    let world = match &store {
        Some(store) => store.load_or_new(&config.network.name).await?,
        None => World::new(config.network.name.as_str()),
    };
    info!(
        network = world.network(),
        contracts = world.contracts().len(),
        "world ready"
    );

    let lines: Vec<String> = match &cli.file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read scenario {}", path.display()))?
            .lines()
            .map(str::to_owned)
            .collect(),
        None => cli.events.clone(),
    };

    let runner = ScenarioRunner::new(ctx, config.network.from, store);
    match runner.run_scenario(world, &lines).await {
        Ok(world) => {
            info!(
                version = world.version(),
                events = world.event_log().len(),
                "scenario finished"
            );
            Ok(())
        }
        Err(failure) => {
            error!(
                line = failure.line,
                contracts = failure.world.contracts().len(),
                error = %failure.source,
                "scenario aborted"
            );
            Err(anyhow::Error::new(*failure))
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
