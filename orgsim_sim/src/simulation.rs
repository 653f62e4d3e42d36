//! The run driver.
//!
//! A [`Simulation`] builds the organisation from a [`SimulationConfig`] and
//! exposes the run as a [`TickSequence`]: a lazy iterator producing one
//! [`StepOutput`] per completed tick. The sequence ends after the configured
//! tick count, and the consumer may stop requesting ticks at any boundary
//! without side effects on already-applied state.

use crate::config::{SimulationConfig, StreamKind};
use crate::model::{FirstOrderPlant, FixedOutputState, StaticBoard, WeightedReporting};
use nalgebra::DVector;
use orgsim_core::{
    AgentSet, EventLog, ModelError, Organisation, OrganisationSnapshot, RandomStreamFactory,
    State, StateCatalog,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

const SOURCE: &str = "Simulation";

/// Result of one completed tick.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutput {
    pub clock_tick: u64,
    pub snapshot: OrganisationSnapshot,
}

/// A configured, not yet running simulation.
pub struct Simulation {
    organisation: Organisation,
    clock_ticks: u64,
    log: EventLog,
}

impl Simulation {
    /// Builds the organisation from configuration.
    ///
    /// Fails with the underlying [`ModelError`] if the tensors or the
    /// collaborator dimensions are inconsistent; no partially built
    /// simulation is returned.
    pub fn new(config: &SimulationConfig, log: EventLog) -> Result<Self, ModelError> {
        log.trace(SOURCE, "initialising simulation", None);

        let mut factory = match &config.random_stream {
            StreamKind::Static { seeds } => RandomStreamFactory::from_seeds(seeds.clone()),
            StreamKind::Random => RandomStreamFactory::from_entropy(),
        };

        let states: Vec<Arc<dyn State>> = config
            .org
            .states
            .iter()
            .map(|control| {
                Arc::new(FixedOutputState::new(DVector::from_vec(control.clone())))
                    as Arc<dyn State>
            })
            .collect();
        let catalog: StateCatalog = states.into();

        let agent_set = AgentSet::new(
            config.org.agent_set.clone(),
            catalog,
            factory.new_stream(),
            log.clone(),
            config.org.clock_tick_seconds,
        )?;

        let organisation = Organisation::new(
            Box::new(StaticBoard::from_config(&config.org.board)),
            agent_set,
            Box::new(FirstOrderPlant::from_config(
                &config.org.plant,
                config.org.clock_tick_seconds,
            )),
            Box::new(WeightedReporting::from_config(&config.org.reporting)),
            log.clone(),
        )?;

        let clock_ticks = config.clock_ticks();
        log.trace(
            SOURCE,
            "simulation initialised",
            Some(json!({ "clock_ticks": clock_ticks })),
        );
        Ok(Self {
            organisation,
            clock_ticks,
            log,
        })
    }

    /// Number of ticks the run will execute.
    pub fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    pub fn organisation(&self) -> &Organisation {
        &self.organisation
    }

    /// Consumes the simulation and returns the lazy tick sequence.
    pub fn run(self) -> TickSequence {
        self.log.trace(
            SOURCE,
            format!("running simulation for {} clock ticks", self.clock_ticks),
            None,
        );
        TickSequence {
            organisation: self.organisation,
            clock_ticks: self.clock_ticks,
            next_tick: 0,
            failed: false,
            log: self.log,
        }
    }
}

/// Lazy, tick-indexed sequence of simulation steps.
///
/// Each `next()` call executes exactly one tick. After a failed tick the
/// sequence fuses and yields nothing further.
pub struct TickSequence {
    organisation: Organisation,
    clock_ticks: u64,
    next_tick: u64,
    failed: bool,
    log: EventLog,
}

impl TickSequence {
    /// The organisation in its current mid-run state.
    pub fn organisation(&self) -> &Organisation {
        &self.organisation
    }
}

impl Iterator for TickSequence {
    type Item = Result<StepOutput, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_tick >= self.clock_ticks {
            return None;
        }
        let clock_tick = self.next_tick;
        self.log.trace(
            SOURCE,
            format!("beginning clock tick {clock_tick}"),
            None,
        );
        if let Err(error) = self.organisation.transition_state() {
            self.failed = true;
            return Some(Err(error));
        }
        self.next_tick += 1;
        self.log.trace(
            SOURCE,
            format!("completed clock tick {clock_tick}"),
            None,
        );
        Some(Ok(StepOutput {
            clock_tick,
            snapshot: self.organisation.snapshot(),
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = (self.clock_ticks - self.next_tick) as usize;
        (0, Some(remaining))
    }
}
