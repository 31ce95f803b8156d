//! Command-line arguments.

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::Parser;
use scenario_core::ScenarioConfig;

/// Run lending-protocol scenario events against a network.
///
/// Events come either from a scenario file (one event per line, `#` starts a
/// comment) or from repeated `--event` flags. Execution stops at the first
/// failing event.
#[derive(Debug, Parser)]
#[command(name = "scenario-runner", version, about)]
pub(crate) struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "SCENARIO_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Network to run against, overrides `network.name`
    #[arg(short, long)]
    pub(crate) network: Option<String>,

    /// Sending account, overrides `network.from`
    #[arg(long, value_parser = parse_address)]
    pub(crate) from: Option<Address>,

    /// Reject leftover input even for catchall fetchers
    #[arg(long)]
    pub(crate) strict: bool,

    /// Do not load or save the network file
    #[arg(long)]
    pub(crate) no_persist: bool,

    /// Scenario file to run
    #[arg(short, long, conflicts_with = "events")]
    pub(crate) file: Option<PathBuf>,

    /// Event to run; may be repeated
    #[arg(short, long = "event", value_name = "EVENT")]
    pub(crate) events: Vec<String>,
}

impl Cli {
    /// Apply flag overrides on top of file and environment configuration.
    pub(crate) fn apply(&self, config: &mut ScenarioConfig) {
        if let Some(network) = &self.network {
            config.network.name.clone_from(network);
        }
        if let Some(from) = self.from {
            config.network.from = from;
        }
        if self.strict {
            config.dispatch.strict_catchall = true;
        }
        if self.no_persist {
            config.persistence.enabled = false;
        }
    }
}

fn parse_address(value: &str) -> Result<Address, String> {
    value
        .parse()
        .map_err(|err| format!("`{value}` is not an address: {err}"))
}
