//! Simulation harness for the orgsim organisation model.
//!
//! This crate supplies what the core deliberately leaves to the caller: a
//! serde-backed configuration format, reference board/plant/reporting
//! implementations, and the run driver that exposes a finite run as a lazy
//! tick sequence.
//!
//! # Usage
//!
//! ```ignore
//! use orgsim_sim::{Simulation, SimulationConfig};
//! use orgsim_core::EventLog;
//!
//! let config = SimulationConfig::demo(10, 3, 1.0, 42);
//! let simulation = Simulation::new(&config, EventLog::new())?;
//! for step in simulation.run() {
//!     let step = step?;
//!     println!("tick {}: {:?}", step.clock_tick, step.snapshot.agent_states);
//! }
//! ```

pub mod config;
pub mod model;
pub mod simulation;

pub use config::{
    BoardConfig, OrgModelConfig, PlantConfig, ReportingConfig, SimulationConfig, StreamKind,
};
pub use model::{FirstOrderPlant, FixedOutputState, StaticBoard, WeightedReporting};
pub use simulation::{Simulation, StepOutput, TickSequence};
