//! The organisation orchestrator.
//!
//! An [`Organisation`] owns one board, one agent set, one plant and one
//! reporting model, and executes the fixed five-stage tick pipeline. Cross-
//! component dimension consistency is validated once at construction; a
//! mismatch fails construction outright, never the first tick.

use crate::agent_set::AgentSet;
use crate::collaborators::{Board, Plant, Reporting, Targets};
use crate::error::ModelError;
use crate::log::EventLog;
use serde::Serialize;
use serde_json::json;

const SOURCE: &str = "Organisation";

/// Immutable view of the organisation after a completed tick.
#[derive(Debug, Clone, Serialize)]
pub struct OrganisationSnapshot {
    pub clock_tick: u64,
    /// State index of every agent, in agent order.
    pub agent_states: Vec<usize>,
    pub plant_state: Vec<f64>,
    pub reporting: Vec<f64>,
}

pub struct Organisation {
    board: Box<dyn Board>,
    agent_set: AgentSet,
    plant: Box<dyn Plant>,
    reporting: Box<dyn Reporting>,
    log: EventLog,
    clock_tick: u64,
}

impl Organisation {
    /// Wires the four components together after the one-time dimension
    /// check. On mismatch no organisation is returned.
    pub fn new(
        board: Box<dyn Board>,
        agent_set: AgentSet,
        plant: Box<dyn Plant>,
        reporting: Box<dyn Reporting>,
        log: EventLog,
    ) -> Result<Self, ModelError> {
        log.trace(SOURCE, "initialising organisation", None);
        let organisation = Self {
            board,
            agent_set,
            plant,
            reporting,
            log,
            clock_tick: 0,
        };
        organisation.check_consistency()?;
        organisation
            .log
            .trace(SOURCE, "organisation initialised", None);
        Ok(organisation)
    }

    /// Executes one tick of the five-stage pipeline:
    ///
    /// 1. the board consumes last tick's reporting vector and emits targets;
    /// 2. the agent set samples new agent states and emits the control-input
    ///    tensor;
    /// 3. the plant consumes the control input and emits the new process
    ///    state;
    /// 4. the reporting model derives the reporting vector from the process
    ///    state, its delta and the control input;
    /// 5. the agent set recalibrates its priority tensor from the target
    ///    deviations.
    ///
    /// The tick counter increments only after stage 5 completes.
    pub fn transition_state(&mut self) -> Result<(), ModelError> {
        self.log.trace(SOURCE, "transitioning organisation state", None);

        let targets: Targets = self
            .board
            .transition_state(self.reporting.reporting_vector());
        let control_input = self.agent_set.transition_state()?;
        let plant_state = self.plant.transition_state(&control_input);
        let reporting = self.reporting.transition_state(
            &plant_state,
            self.plant.delta_vector(),
            &control_input,
        );
        self.agent_set
            .recalculate_params(&targets, &plant_state, &reporting)?;

        self.clock_tick += 1;
        self.log.trace(
            SOURCE,
            "organisation state transitioned",
            Some(json!({ "clock_tick": self.clock_tick })),
        );
        Ok(())
    }

    /// Validates cross-component dimension consistency.
    ///
    /// The plant's degrees of freedom must equal both the board's plant
    /// target length and the judgment tensor's 4th dimension; symmetrically
    /// for reporting and the incentive tensor.
    pub fn check_consistency(&self) -> Result<(), ModelError> {
        self.log.trace(
            SOURCE,
            "checking cross-component dimension consistency",
            None,
        );
        self.agent_set.check_consistency()?;

        let chi = self.plant.degrees_of_freedom();
        let psi = self.reporting.degrees_of_freedom();
        let plan = self.board.plan();

        if chi != plan.plant_state.len() {
            return Err(self.dimension_error(format!(
                "plant degrees of freedom ({chi}) do not match board plant targets ({})",
                plan.plant_state.len()
            )));
        }
        if chi != self.agent_set.plant_degrees_of_freedom() {
            return Err(self.dimension_error(format!(
                "plant degrees of freedom ({chi}) do not match the judgment tensor ({})",
                self.agent_set.plant_degrees_of_freedom()
            )));
        }
        if psi != plan.reporting.len() {
            return Err(self.dimension_error(format!(
                "reporting degrees of freedom ({psi}) do not match board reporting targets ({})",
                plan.reporting.len()
            )));
        }
        if psi != self.agent_set.reporting_degrees_of_freedom() {
            return Err(self.dimension_error(format!(
                "reporting degrees of freedom ({psi}) do not match the incentive tensor ({})",
                self.agent_set.reporting_degrees_of_freedom()
            )));
        }

        self.log
            .trace(SOURCE, "dimension consistency check passed", None);
        Ok(())
    }

    /// Ticks completed so far.
    pub fn clock_tick(&self) -> u64 {
        self.clock_tick
    }

    pub fn snapshot(&self) -> OrganisationSnapshot {
        OrganisationSnapshot {
            clock_tick: self.clock_tick,
            agent_states: self.agent_set.agent_state_indices(),
            plant_state: self.plant.state_vector().iter().copied().collect(),
            reporting: self.reporting.reporting_vector().iter().copied().collect(),
        }
    }

    pub fn agent_set(&self) -> &AgentSet {
        &self.agent_set
    }

    pub fn board(&self) -> &dyn Board {
        self.board.as_ref()
    }

    pub fn plant(&self) -> &dyn Plant {
        self.plant.as_ref()
    }

    pub fn reporting(&self) -> &dyn Reporting {
        self.reporting.as_ref()
    }

    fn dimension_error(&self, message: String) -> ModelError {
        self.log.error(SOURCE, message.clone(), None);
        ModelError::DimensionMismatch(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{State, StateCatalog};
    use crate::agent_set::AgentSetTensors;
    use crate::random::SeededStream;
    use crate::tensor;
    use nalgebra::{dvector, DMatrix, DVector};
    use std::sync::{Arc, Mutex};

    struct Pulse(f64);

    impl State for Pulse {
        fn emit(&self) -> DVector<f64> {
            dvector![self.0]
        }
    }

    fn catalog(count: usize) -> StateCatalog {
        let states: Vec<Arc<dyn State>> = (0..count)
            .map(|i| Arc::new(Pulse(i as f64)) as Arc<dyn State>)
            .collect();
        states.into()
    }

    type CallTrace = Arc<Mutex<Vec<&'static str>>>;

    struct StubBoard {
        plan: Targets,
        calls: CallTrace,
    }

    impl Board for StubBoard {
        fn transition_state(&mut self, _previous_reporting: &DVector<f64>) -> Targets {
            self.calls.lock().unwrap().push("board");
            self.plan.clone()
        }

        fn plan(&self) -> &Targets {
            &self.plan
        }
    }

    struct StubPlant {
        state: DVector<f64>,
        delta: DVector<f64>,
        calls: CallTrace,
    }

    impl Plant for StubPlant {
        fn transition_state(&mut self, _control_input: &DMatrix<f64>) -> DVector<f64> {
            self.calls.lock().unwrap().push("plant");
            self.state.clone()
        }

        fn state_vector(&self) -> &DVector<f64> {
            &self.state
        }

        fn delta_vector(&self) -> &DVector<f64> {
            &self.delta
        }

        fn degrees_of_freedom(&self) -> usize {
            self.state.len()
        }
    }

    struct StubReporting {
        reporting: DVector<f64>,
        calls: CallTrace,
    }

    impl Reporting for StubReporting {
        fn transition_state(
            &mut self,
            _plant_state: &DVector<f64>,
            _plant_delta: &DVector<f64>,
            _control_input: &DMatrix<f64>,
        ) -> DVector<f64> {
            self.calls.lock().unwrap().push("reporting");
            self.reporting.clone()
        }

        fn reporting_vector(&self) -> &DVector<f64> {
            &self.reporting
        }

        fn degrees_of_freedom(&self) -> usize {
            self.reporting.len()
        }
    }

    fn agent_set(agents: usize, states: usize, plant_dof: usize, reporting_dof: usize) -> AgentSet {
        let row = 1.0 / states as f64;
        let tensors = AgentSetTensors {
            priority: vec![vec![vec![row; states]; states]; agents],
            influence: tensor::zeros4(agents, agents, states, states),
            judgment: tensor::zeros4(agents, states, states, plant_dof),
            incentive: tensor::zeros4(agents, states, states, reporting_dof),
        };
        AgentSet::new(
            tensors,
            catalog(states),
            Box::new(SeededStream::new(42)),
            EventLog::new(),
            1.0,
        )
        .unwrap()
    }

    fn components(
        plant_dof: usize,
        reporting_dof: usize,
        board_plant_dof: usize,
    ) -> (Box<dyn Board>, Box<dyn Plant>, Box<dyn Reporting>, CallTrace) {
        let calls: CallTrace = Arc::new(Mutex::new(Vec::new()));
        let board = Box::new(StubBoard {
            plan: Targets {
                plant_state: DVector::zeros(board_plant_dof),
                reporting: DVector::zeros(reporting_dof),
            },
            calls: Arc::clone(&calls),
        });
        let plant = Box::new(StubPlant {
            state: DVector::zeros(plant_dof),
            delta: DVector::zeros(plant_dof),
            calls: Arc::clone(&calls),
        });
        let reporting = Box::new(StubReporting {
            reporting: DVector::zeros(reporting_dof),
            calls: Arc::clone(&calls),
        });
        (board, plant, reporting, calls)
    }

    #[test]
    fn test_pipeline_stage_order_and_tick_counter() {
        let (board, plant, reporting, calls) = components(1, 1, 1);
        let mut organisation = Organisation::new(
            board,
            agent_set(2, 2, 1, 1),
            plant,
            reporting,
            EventLog::new(),
        )
        .unwrap();

        assert_eq!(organisation.clock_tick(), 0);
        organisation.transition_state().unwrap();
        assert_eq!(organisation.clock_tick(), 1);
        assert_eq!(*calls.lock().unwrap(), vec!["board", "plant", "reporting"]);

        organisation.transition_state().unwrap();
        assert_eq!(organisation.clock_tick(), 2);
    }

    #[test]
    fn test_snapshot_reflects_components() {
        let (board, plant, reporting, _calls) = components(2, 1, 2);
        let mut organisation = Organisation::new(
            board,
            agent_set(3, 2, 2, 1),
            plant,
            reporting,
            EventLog::new(),
        )
        .unwrap();
        organisation.transition_state().unwrap();

        let snapshot = organisation.snapshot();
        assert_eq!(snapshot.clock_tick, 1);
        assert_eq!(snapshot.agent_states.len(), 3);
        assert_eq!(snapshot.plant_state.len(), 2);
        assert_eq!(snapshot.reporting.len(), 1);
    }

    #[test]
    fn test_board_target_mismatch_fails_construction() {
        // Plant has 1 degree of freedom but the board plans for 2; this must
        // fail at construction, never at the first tick.
        let (board, plant, reporting, _calls) = components(1, 1, 2);
        let result = Organisation::new(
            board,
            agent_set(2, 2, 1, 1),
            plant,
            reporting,
            EventLog::new(),
        );
        assert!(matches!(result, Err(ModelError::DimensionMismatch(_))));
    }

    #[test]
    fn test_judgment_tensor_mismatch_fails_construction() {
        // The agent set was built for a 2-dof plant; wiring a 1-dof plant
        // with a matching 1-dof board still conflicts with the judgment
        // tensor.
        let (board, plant, reporting, _calls) = components(1, 1, 1);
        let result = Organisation::new(
            board,
            agent_set(2, 2, 2, 1),
            plant,
            reporting,
            EventLog::new(),
        );
        assert!(matches!(result, Err(ModelError::DimensionMismatch(_))));
    }

    #[test]
    fn test_incentive_tensor_mismatch_fails_construction() {
        let (board, plant, reporting, _calls) = components(1, 2, 1);
        let result = Organisation::new(
            board,
            agent_set(2, 2, 1, 1),
            plant,
            reporting,
            EventLog::new(),
        );
        assert!(matches!(result, Err(ModelError::DimensionMismatch(_))));
    }
}
