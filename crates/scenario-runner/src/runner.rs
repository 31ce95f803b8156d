//! Scenario step loop.
//!
//! A step parses one event, routes it to its contract namespace, appends the
//! event to the world's log, and optionally saves the result. Steps are
//! applied strictly in order: each awaits completion before the next begins.

use alloy_primitives::Address;
use scenario_contracts::process_contract_event;
use scenario_core::Context;
use scenario_db::NetworkStore;
use scenario_types::Event;
use scenario_world::World;
use tracing::{debug, info, warn};

use crate::error::{ScenarioFailure, StepError};

/// Applies events to worlds.
#[derive(Debug)]
pub(crate) struct ScenarioRunner {
    ctx: Context,
    from: Address,
    store: Option<NetworkStore>,
}

impl ScenarioRunner {
    /// Create a runner. With a store, every successful step is saved.
    pub(crate) const fn new(ctx: Context, from: Address, store: Option<NetworkStore>) -> Self {
        Self { ctx, from, store }
    }

    /// Apply a single event.
    ///
    /// On success the successor world is returned; on failure `world` is
    /// the state to keep.
    pub(crate) async fn run_step(&self, world: &World, text: &str) -> Result<World, StepError> {
        let event = Event::parse(text).map_err(|source| StepError::Parse {
            event: text.to_owned(),
            source,
        })?;
        let canonical = event.to_string();

        let next = process_contract_event(&self.ctx, world, self.from, &event)
            .await
            .map_err(|source| StepError::Contract {
                event: canonical.clone(),
                source,
            })?
            .with_event(canonical.as_str());

        if let Some(store) = &self.store {
            store
                .save(&next)
                .await
                .map_err(|source| StepError::Persist {
                    event: canonical.clone(),
                    source,
                })?;
        }

        debug!(event = %canonical, version = next.version(), "applied event");
        Ok(next)
    }

    /// Apply every event in `lines`, stopping at the first failure.
    ///
    /// Blank lines and lines starting with `#` are skipped. Line numbers in
    /// a [`ScenarioFailure`] count every line, skipped ones included.
    pub(crate) async fn run_scenario<I, S>(
        &self,
        world: World,
        lines: I,
    ) -> Result<World, Box<ScenarioFailure>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut world = world;
        let mut applied = 0_usize;
        for (line, text) in (1_usize..).zip(lines) {
            let text = text.as_ref().trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            match self.run_step(&world, text).await {
                Ok(next) => {
                    world = next;
                    applied = applied.saturating_add(1);
                }
                Err(source) => {
                    warn!(line, event = text, error = %source, "scenario step failed");
                    return Err(Box::new(ScenarioFailure {
                        line,
                        source,
                        world,
                    }));
                }
            }
        }
        info!(
            network = world.network(),
            steps = applied,
            contracts = world.contracts().len(),
            "scenario complete"
        );
        Ok(world)
    }
}
