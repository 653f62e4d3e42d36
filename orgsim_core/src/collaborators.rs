//! Contracts for the externally supplied strategies: target setting
//! (board), process dynamics (plant) and metrics derivation (reporting).
//!
//! The engine only consumes these traits; concrete dynamics live with the
//! caller. Dimension agreement between the three is validated once, at
//! [`crate::Organisation`] construction.

use nalgebra::{DMatrix, DVector};

/// Goal vectors set by the board for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Targets {
    /// Target process state, length `C` (plant degrees of freedom).
    pub plant_state: DVector<f64>,
    /// Target reporting vector, length `P` (reporting degrees of freedom).
    pub reporting: DVector<f64>,
}

/// Target-setting policy.
pub trait Board: Send {
    /// Consumes last tick's reporting vector and emits the targets for this
    /// tick.
    fn transition_state(&mut self, previous_reporting: &DVector<f64>) -> Targets;

    /// Current plan; consumed only by the one-time dimension check at
    /// organisation construction.
    fn plan(&self) -> &Targets;
}

/// Controlled physical process.
pub trait Plant: Send {
    /// Consumes the `[agents][control_dim]` control-input tensor and returns
    /// the new process-state vector of length `C`.
    fn transition_state(&mut self, control_input: &DMatrix<f64>) -> DVector<f64>;

    /// Current process-state vector.
    fn state_vector(&self) -> &DVector<f64>;

    /// Process-state delta since the previous tick. Passed through to the
    /// reporting model, never consumed by the agent set.
    fn delta_vector(&self) -> &DVector<f64>;

    /// `C`, the process-state dimensionality.
    fn degrees_of_freedom(&self) -> usize;
}

/// Metrics-derivation model.
pub trait Reporting: Send {
    /// Derives the reporting vector of length `P` from the new process
    /// state, its delta and the control-input tensor.
    fn transition_state(
        &mut self,
        plant_state: &DVector<f64>,
        plant_delta: &DVector<f64>,
        control_input: &DMatrix<f64>,
    ) -> DVector<f64>;

    /// Current reporting vector.
    fn reporting_vector(&self) -> &DVector<f64>;

    /// `P`, the reporting dimensionality.
    fn degrees_of_freedom(&self) -> usize;
}
