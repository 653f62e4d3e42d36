//! The adaptive transition engine.
//!
//! An [`AgentSet`] owns the agent population and the four parameter tensors.
//! Per tick it performs two operations:
//!
//! - [`AgentSet::transition_state`]: stochastic simultaneous state
//!   transition for every agent via inverse-CDF sampling over each agent's
//!   priority row, returning the stacked control-input tensor.
//! - [`AgentSet::recalculate_params`]: a three-phase, fully synchronous
//!   recalibration of the priority tensor. A weight-space delta couples each
//!   agent to its peers (influence), to the plant's deviation from target
//!   (judgment) and to the reporting deviation from target (incentive); the
//!   delta is projected into probability space through the Jacobian of the
//!   categorical-probability map and applied with saturation clamping,
//!   rounding and per-row renormalisation.
//!
//! Every phase reads only pre-update values: no agent observes another
//! agent's, or its own, already-updated probability mid-computation.

use crate::agent::{Agent, StateCatalog};
use crate::collaborators::Targets;
use crate::error::ModelError;
use crate::log::EventLog;
use crate::random::RandomStream;
use crate::tensor::{self, Tensor3, Tensor4};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::json;

const SOURCE: &str = "AgentSet";

/// Priorities and cumulative rows are rounded to 4 decimal places to
/// neutralise floating-point drift; renormalisation corrects the residue.
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// The four parameter tensors supplied once at agent-set construction.
///
/// Only the priority tensor is mutated afterwards, in place, by
/// recalibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSetTensors {
    /// `[agent][state][state]`, row-stochastic transition probabilities.
    pub priority: Tensor3,
    /// `[agent][agent][state][state]` pairwise peer-influence coefficients.
    pub influence: Tensor4,
    /// `[agent][state][state][plant_dof]` sensitivity to plant deviation.
    pub judgment: Tensor4,
    /// `[agent][state][state][reporting_dof]` sensitivity to reporting
    /// deviation.
    pub incentive: Tensor4,
}

struct Dims {
    agents: usize,
    states: usize,
    plant_dof: usize,
    reporting_dof: usize,
}

/// The agent population plus its transition/recalibration machinery.
pub struct AgentSet {
    agents: Vec<Agent>,
    priority: Tensor3,
    influence: Tensor4,
    judgment: Tensor4,
    incentive: Tensor4,
    delta_w: Tensor3,
    delta_p: Tensor3,
    clock_tick_seconds: f64,
    stream: Box<dyn RandomStream>,
    log: EventLog,
    agent_count: usize,
    state_count: usize,
    plant_dof: usize,
    reporting_dof: usize,
}

impl AgentSet {
    /// Validates tensor shapes, then creates the population.
    ///
    /// All agents start at the terminal index of the state catalog. On any
    /// shape violation the error is broadcast to the log listeners and no
    /// agent is created.
    pub fn new(
        tensors: AgentSetTensors,
        states: StateCatalog,
        stream: Box<dyn RandomStream>,
        log: EventLog,
        clock_tick_seconds: f64,
    ) -> Result<Self, ModelError> {
        log.trace(SOURCE, "initialising agent set", None);

        let dims = Self::validate(
            &tensors.priority,
            &tensors.influence,
            &tensors.judgment,
            &tensors.incentive,
            states.len(),
            &log,
        )?;

        let agents = (0..dims.agents)
            .map(|_| Agent::new(states.len() - 1, states.clone()))
            .collect();

        let agent_set = Self {
            agents,
            priority: tensors.priority,
            influence: tensors.influence,
            judgment: tensors.judgment,
            incentive: tensors.incentive,
            delta_w: tensor::zeros3(dims.agents, dims.states, dims.states),
            delta_p: tensor::zeros3(dims.agents, dims.states, dims.states),
            clock_tick_seconds,
            stream,
            log,
            agent_count: dims.agents,
            state_count: dims.states,
            plant_dof: dims.plant_dof,
            reporting_dof: dims.reporting_dof,
        };
        agent_set.log.trace(SOURCE, "agent set initialised", None);
        Ok(agent_set)
    }

    /// Stochastic simultaneous state transition for every agent.
    ///
    /// Exactly one uniform variate is drawn per agent, in ascending agent
    /// order, before any state is updated; the variate-to-agent mapping is
    /// therefore fixed regardless of how the per-agent loop executes. Returns
    /// the stacked `[agents][control_dim]` control-input tensor.
    pub fn transition_state(&mut self) -> Result<DMatrix<f64>, ModelError> {
        self.log.trace(SOURCE, "transitioning agent states", None);

        let variates: Vec<f64> = (0..self.agent_count)
            .map(|_| self.stream.next_uniform())
            .collect();

        // Cumulative transition probabilities per (agent, origin) row,
        // computed on a value copy of the priority tensor. The terminal
        // entry is rounded so the inverse-CDF search cannot run past the
        // last index on accumulated round-off.
        let mut cumulative = self.priority.clone();
        for plane in &mut cumulative {
            for row in plane.iter_mut() {
                for tau in 1..row.len() {
                    row[tau] += row[tau - 1];
                }
                if let Some(last) = row.last_mut() {
                    *last = round4(*last);
                }
            }
        }

        for (alpha, agent) in self.agents.iter_mut().enumerate() {
            let row = &cumulative[alpha][agent.state_index()];
            match row.iter().position(|&threshold| variates[alpha] < threshold) {
                Some(tau) => agent.set_state_index(tau),
                None => {
                    let message = format!(
                        "cumulative priority row for agent {alpha} does not cover variate {}",
                        variates[alpha]
                    );
                    self.log.error(SOURCE, message.clone(), None);
                    return Err(ModelError::InvariantViolation(message));
                }
            }
        }

        let control_input = self.emit_control_input()?;
        self.log.trace(
            SOURCE,
            "agent states transitioned",
            Some(json!({ "agent_states": self.agent_state_indices() })),
        );
        Ok(control_input)
    }

    /// Stacks the control vector of every agent's current state into the
    /// `[agents][control_dim]` control-input tensor.
    pub fn emit_control_input(&self) -> Result<DMatrix<f64>, ModelError> {
        let rows: Vec<DVector<f64>> = self
            .agents
            .iter()
            .map(Agent::emit_control_vector)
            .collect();
        let control_dim = rows.first().map_or(0, DVector::len);
        if rows.iter().any(|row| row.len() != control_dim) {
            let message = "states emit control vectors of differing lengths".to_string();
            self.log.error(SOURCE, message.clone(), None);
            return Err(ModelError::InvariantViolation(message));
        }

        let mut control_input = DMatrix::zeros(self.agent_count, control_dim);
        for (alpha, row) in rows.iter().enumerate() {
            control_input.set_row(alpha, &row.transpose());
        }
        Ok(control_input)
    }

    /// Recalibrates the priority tensor against the tick's target deviations.
    ///
    /// Phase 1 computes the weight-space delta
    /// `Δw[α,σ,τ] = dt · (Σ_β infl·(p_α − p_β) + Σ_χ judg·(x − x*) + Σ_ψ inc·(y − y*))`.
    /// Phase 2 projects it through `J(τ,λ) = p_τ·(1[τ=λ] − p_λ)`, the
    /// Jacobian of the categorical-probability map, so each row's delta
    /// redistributes mass inside the simplex instead of creating it. Phase 3
    /// clamps every delta to `[−p, 1−p]`, applies it, rounds to 4 decimals
    /// and renormalises the row; if any row needed clamping a single
    /// warning-level event is emitted for the whole call.
    pub fn recalculate_params(
        &mut self,
        targets: &Targets,
        plant_state: &DVector<f64>,
        reporting: &DVector<f64>,
    ) -> Result<(), ModelError> {
        self.log.trace(SOURCE, "recalculating priority tensor", None);
        self.check_signal_lengths(targets, plant_state, reporting)?;

        for alpha in 0..self.agent_count {
            for sigma in 0..self.state_count {
                for tau in 0..self.state_count {
                    let mut delta_w = 0.0;
                    for beta in 0..self.agent_count {
                        delta_w += self.influence[alpha][beta][sigma][tau]
                            * (self.priority[alpha][sigma][tau]
                                - self.priority[beta][sigma][tau]);
                    }
                    for chi in 0..self.plant_dof {
                        delta_w += self.judgment[alpha][sigma][tau][chi]
                            * (plant_state[chi] - targets.plant_state[chi]);
                    }
                    for psi in 0..self.reporting_dof {
                        delta_w += self.incentive[alpha][sigma][tau][psi]
                            * (reporting[psi] - targets.reporting[psi]);
                    }
                    // Scaling by the tick duration keeps the adaptation rate
                    // independent of the chosen step size.
                    self.delta_w[alpha][sigma][tau] = delta_w * self.clock_tick_seconds;
                }
            }
        }

        for alpha in 0..self.agent_count {
            for sigma in 0..self.state_count {
                for tau in 0..self.state_count {
                    let mut delta_p = 0.0;
                    for lambda in 0..self.state_count {
                        let kronecker = if tau == lambda { 1.0 } else { 0.0 };
                        let jacobian = self.priority[alpha][sigma][tau]
                            * (kronecker - self.priority[alpha][sigma][lambda]);
                        delta_p += jacobian * self.delta_w[alpha][sigma][lambda];
                    }
                    self.delta_p[alpha][sigma][tau] = delta_p;
                }
            }
        }

        let mut saturated = false;
        for alpha in 0..self.agent_count {
            for sigma in 0..self.state_count {
                let mut row_saturated = false;
                for tau in 0..self.state_count {
                    // Clamp so high gains or a long tick cannot push the
                    // entry outside [0, 1].
                    let current = self.priority[alpha][sigma][tau];
                    let delta_p = &mut self.delta_p[alpha][sigma][tau];
                    if *delta_p < -current {
                        *delta_p = -current;
                        row_saturated = true;
                    } else if *delta_p > 1.0 - current {
                        *delta_p = 1.0 - current;
                        row_saturated = true;
                    }
                    self.priority[alpha][sigma][tau] = round4(current + *delta_p);
                }

                let sum: f64 = self.priority[alpha][sigma].iter().sum();
                if !sum.is_finite() || sum <= 0.0 {
                    let message =
                        format!("priority row ({alpha}, {sigma}) sums to {sum} after update");
                    self.log.error(SOURCE, message.clone(), None);
                    return Err(ModelError::InvariantViolation(message));
                }
                // Renormalise the row so it sums to exactly 1, correcting
                // rounding drift and any clamp-induced mass change.
                for entry in &mut self.priority[alpha][sigma] {
                    *entry /= sum;
                }
                saturated |= row_saturated;
            }
        }

        if saturated {
            self.log.warn(
                SOURCE,
                "priority tensor saturation detected, affected rows were clamped and renormalised",
                None,
            );
        }
        self.log.trace(SOURCE, "priority tensor recalculated", None);
        Ok(())
    }

    /// Re-validates the tensor shapes against the current population.
    pub fn check_consistency(&self) -> Result<(), ModelError> {
        Self::validate(
            &self.priority,
            &self.influence,
            &self.judgment,
            &self.incentive,
            self.state_count,
            &self.log,
        )
        .map(|_| ())
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// `C`: the judgment tensor's 4th dimension.
    pub fn plant_degrees_of_freedom(&self) -> usize {
        self.plant_dof
    }

    /// `P`: the incentive tensor's 4th dimension.
    pub fn reporting_degrees_of_freedom(&self) -> usize {
        self.reporting_dof
    }

    /// Current state index of every agent, in agent order.
    pub fn agent_state_indices(&self) -> Vec<usize> {
        self.agents.iter().map(Agent::state_index).collect()
    }

    pub fn priority_tensor(&self) -> &Tensor3 {
        &self.priority
    }

    /// Probability-space deltas from the most recent recalibration.
    pub fn delta_p(&self) -> &Tensor3 {
        &self.delta_p
    }

    fn check_signal_lengths(
        &self,
        targets: &Targets,
        plant_state: &DVector<f64>,
        reporting: &DVector<f64>,
    ) -> Result<(), ModelError> {
        let mismatch = if plant_state.len() != self.plant_dof {
            Some(format!(
                "plant state has length {}, expected {}",
                plant_state.len(),
                self.plant_dof
            ))
        } else if reporting.len() != self.reporting_dof {
            Some(format!(
                "reporting vector has length {}, expected {}",
                reporting.len(),
                self.reporting_dof
            ))
        } else if targets.plant_state.len() != self.plant_dof
            || targets.reporting.len() != self.reporting_dof
        {
            Some("target vectors do not match plant/reporting dimensions".to_string())
        } else {
            None
        };
        match mismatch {
            Some(message) => {
                self.log.error(SOURCE, message.clone(), None);
                Err(ModelError::InvariantViolation(message))
            }
            None => Ok(()),
        }
    }

    fn validate(
        priority: &Tensor3,
        influence: &Tensor4,
        judgment: &Tensor4,
        incentive: &Tensor4,
        catalog_len: usize,
        log: &EventLog,
    ) -> Result<Dims, ModelError> {
        match Self::dims(priority, influence, judgment, incentive, catalog_len) {
            Ok(dims) => Ok(dims),
            Err(cause) => {
                log.error(
                    SOURCE,
                    "agent set consistency check failed",
                    Some(json!({ "cause": cause })),
                );
                Err(ModelError::Configuration(cause))
            }
        }
    }

    fn dims(
        priority: &Tensor3,
        influence: &Tensor4,
        judgment: &Tensor4,
        incentive: &Tensor4,
        catalog_len: usize,
    ) -> Result<Dims, String> {
        let priority_shape =
            tensor::shape3(priority).ok_or("ragged priority tensor".to_string())?;
        let influence_shape =
            tensor::shape4(influence).ok_or("ragged influence tensor".to_string())?;
        let judgment_shape =
            tensor::shape4(judgment).ok_or("ragged judgment tensor".to_string())?;
        let incentive_shape =
            tensor::shape4(incentive).ok_or("ragged incentive tensor".to_string())?;

        let [agents, priority_sigma, priority_tau] = priority_shape;
        if agents == 0 {
            return Err("no agents in agent set".to_string());
        }
        if catalog_len == 0 {
            return Err("no states in state catalog".to_string());
        }
        let states = catalog_len;
        if priority_sigma != states || priority_tau != states {
            return Err(
                "inconsistent state catalog size and priority tensor dimensions".to_string(),
            );
        }
        if influence_shape[0] != agents {
            return Err("inconsistent agent dimension (alpha) in influence tensor".to_string());
        }
        if influence_shape[1] != agents {
            return Err("inconsistent agent dimension (beta) in influence tensor".to_string());
        }
        if influence_shape[2] != states || influence_shape[3] != states {
            return Err("inconsistent state dimensions in influence tensor".to_string());
        }
        if judgment_shape[0] != agents {
            return Err("inconsistent agent dimension (alpha) in judgment tensor".to_string());
        }
        if judgment_shape[1] != states || judgment_shape[2] != states {
            return Err("inconsistent state dimensions in judgment tensor".to_string());
        }
        if incentive_shape[0] != agents {
            return Err("inconsistent agent dimension (alpha) in incentive tensor".to_string());
        }
        if incentive_shape[1] != states || incentive_shape[2] != states {
            return Err("inconsistent state dimensions in incentive tensor".to_string());
        }

        Ok(Dims {
            agents,
            states,
            plant_dof: judgment_shape[3],
            reporting_dof: incentive_shape[3],
        })
    }
}
