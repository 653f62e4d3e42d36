//! Adaptive organisation model.
//!
//! An organisation is simulated as a population of autonomous agents whose
//! behaviour follows per-agent discrete-state transition probabilities. The
//! probabilities are not fixed: every clock tick they are recalibrated by a
//! gradient-style law coupling each agent to its peers, to a controlled
//! physical process (the plant) and to a derived reporting metric, measured
//! against targets set by a board.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      Organisation                         │
//! │                                                           │
//! │   Board ──targets──────────────────────────┐              │
//! │                                            ▼              │
//! │   AgentSet ──control input──► Plant ──► Reporting         │
//! │      ▲                          │            │            │
//! │      └───────recalibration──────┴────────────┘            │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Each call to [`Organisation::transition_state`] runs the fixed five-stage
//! pipeline: the board emits targets from last tick's reporting vector, the
//! agent set samples new agent states and emits the control-input tensor, the
//! plant consumes it and produces a new process state, the reporting model
//! derives the reporting vector, and the agent set recalibrates its priority
//! tensor from the target deviations.
//!
//! Board, plant and reporting dynamics are supplied by the caller through the
//! traits in [`collaborators`]; the crate owns only the transition and
//! recalibration engine.

pub mod agent;
pub mod agent_set;
pub mod collaborators;
pub mod error;
pub mod log;
pub mod organisation;
pub mod random;
pub mod tensor;

pub use agent::{Agent, State, StateCatalog};
pub use agent_set::{AgentSet, AgentSetTensors};
pub use collaborators::{Board, Plant, Reporting, Targets};
pub use error::ModelError;
pub use log::{EventLog, LogEvent, LogLevel};
pub use organisation::{Organisation, OrganisationSnapshot};
pub use random::{EntropyStream, RandomStream, RandomStreamFactory, SeededStream};
