//! Behavioural states and the agents that occupy them.

use nalgebra::DVector;
use std::sync::Arc;

/// A discrete behavioural mode.
///
/// A state is identity plus a fixed control vector; it carries no mutable
/// fields the engine depends on. The emitted vector's length must equal the
/// plant's control dimensionality and be the same for every state in a
/// catalog.
pub trait State: Send + Sync {
    /// Emits the control vector this mode feeds to the plant.
    fn emit(&self) -> DVector<f64>;
}

/// Shared, externally owned catalog of states.
///
/// Agents reference the catalog by index; the agent set never replaces it.
pub type StateCatalog = Arc<[Arc<dyn State>]>;

/// One agent: a mutable index into the shared state catalog.
pub struct Agent {
    state_index: usize,
    states: StateCatalog,
}

impl Agent {
    pub fn new(initial_state_index: usize, states: StateCatalog) -> Self {
        Self {
            state_index: initial_state_index,
            states,
        }
    }

    pub fn state_index(&self) -> usize {
        self.state_index
    }

    pub fn set_state_index(&mut self, state_index: usize) {
        self.state_index = state_index;
    }

    /// Pass-through to the state at the current index.
    pub fn emit_control_vector(&self) -> DVector<f64> {
        self.states[self.state_index].emit()
    }
}
