//! Reference collaborator implementations.
//!
//! These give the harness a complete runnable organisation without the
//! caller writing any dynamics: a constant-plan board, a first-order-lag
//! plant driven by mean control effort (optionally disturbed by seeded
//! Gaussian noise) and a reporting model blending plant level, drift and
//! control activity.

use crate::config::{BoardConfig, PlantConfig, ReportingConfig};
use nalgebra::{DMatrix, DVector};
use orgsim_core::{Board, Plant, Reporting, State, Targets};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// A behavioural state that always emits the same control vector.
pub struct FixedOutputState {
    control: DVector<f64>,
}

impl FixedOutputState {
    pub fn new(control: DVector<f64>) -> Self {
        Self { control }
    }
}

impl State for FixedOutputState {
    fn emit(&self) -> DVector<f64> {
        self.control.clone()
    }
}

/// A board that re-issues the same plan every tick.
pub struct StaticBoard {
    plan: Targets,
}

impl StaticBoard {
    pub fn new(plan: Targets) -> Self {
        Self { plan }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(Targets {
            plant_state: DVector::from_vec(config.plant_targets.clone()),
            reporting: DVector::from_vec(config.reporting_targets.clone()),
        })
    }
}

impl Board for StaticBoard {
    fn transition_state(&mut self, _previous_reporting: &DVector<f64>) -> Targets {
        self.plan.clone()
    }

    fn plan(&self) -> &Targets {
        &self.plan
    }
}

/// First-order lag toward `gain * mean control effort`, per degree of
/// freedom, with an optional seeded Gaussian disturbance.
pub struct FirstOrderPlant {
    state: DVector<f64>,
    delta: DVector<f64>,
    gain: f64,
    smoothing: f64,
    disturbance: Option<(Normal<f64>, ChaCha8Rng)>,
}

impl FirstOrderPlant {
    pub fn from_config(config: &PlantConfig, clock_tick_seconds: f64) -> Self {
        let dof = config.initial_state.len();
        let smoothing = if config.lag_seconds > 0.0 {
            (clock_tick_seconds / config.lag_seconds).min(1.0)
        } else {
            1.0
        };
        let disturbance = Normal::new(0.0, config.disturbance_std)
            .ok()
            .filter(|_| config.disturbance_std > 0.0)
            .map(|normal| (normal, ChaCha8Rng::seed_from_u64(config.disturbance_seed)));
        Self {
            state: DVector::from_vec(config.initial_state.clone()),
            delta: DVector::zeros(dof),
            gain: config.gain,
            smoothing,
            disturbance,
        }
    }
}

impl Plant for FirstOrderPlant {
    fn transition_state(&mut self, control_input: &DMatrix<f64>) -> DVector<f64> {
        let effort = if control_input.is_empty() {
            0.0
        } else {
            control_input.mean()
        };
        let previous = self.state.clone();
        for entry in self.state.iter_mut() {
            let mut target = self.gain * effort;
            if let Some((normal, rng)) = &mut self.disturbance {
                target += normal.sample(rng);
            }
            *entry += self.smoothing * (target - *entry);
        }
        self.delta = &self.state - &previous;
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

/// Derives each reporting dimension from plant level, plant drift and mean
/// control activity.
pub struct WeightedReporting {
    reporting: DVector<f64>,
    state_weight: f64,
    control_weight: f64,
}

impl WeightedReporting {
    pub fn from_config(config: &ReportingConfig) -> Self {
        Self {
            reporting: DVector::from_vec(config.initial.clone()),
            state_weight: config.state_weight,
            control_weight: config.control_weight,
        }
    }
}

impl Reporting for WeightedReporting {
    fn transition_state(
        &mut self,
        plant_state: &DVector<f64>,
        plant_delta: &DVector<f64>,
        control_input: &DMatrix<f64>,
    ) -> DVector<f64> {
        let level = if plant_state.is_empty() {
            0.0
        } else {
            plant_state.mean()
        };
        let drift = if plant_delta.is_empty() {
            0.0
        } else {
            plant_delta.mean()
        };
        let activity = if control_input.is_empty() {
            0.0
        } else {
            control_input.mean()
        };
        let dimensions = self.reporting.len().max(1) as f64;
        for (psi, entry) in self.reporting.iter_mut().enumerate() {
            // Stagger the mix so reporting dimensions are not identical
            // copies of each other.
            let blend = 1.0 + psi as f64 / dimensions;
            *entry = self.state_weight * (level + drift) + self.control_weight * activity * blend;
        }
        self.reporting.clone()
    }

    fn reporting_vector(&self) -> &DVector<f64> {
        &self.reporting
    }

    fn degrees_of_freedom(&self) -> usize {
        self.reporting.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn test_static_board_re_emits_its_plan() {
        let plan = Targets {
            plant_state: dvector![1.0],
            reporting: dvector![0.5, 0.5],
        };
        let mut board = StaticBoard::new(plan.clone());
        assert_eq!(board.transition_state(&dvector![9.0, 9.0]), plan);
        assert_eq!(board.plan(), &plan);
    }

    #[test]
    fn test_plant_converges_toward_gain_times_effort() {
        let config = PlantConfig {
            initial_state: vec![0.0],
            gain: 2.0,
            lag_seconds: 100.0,
            disturbance_std: 0.0,
            disturbance_seed: 0,
        };
        let mut plant = FirstOrderPlant::from_config(&config, 50.0);
        let control = dmatrix![1.0; 1.0];

        let mut state = dvector![0.0];
        for _ in 0..64 {
            state = plant.transition_state(&control);
        }
        // Steady state is gain * mean(control) = 2.0.
        assert_relative_eq!(state[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_plant_delta_tracks_state_change() {
        let config = PlantConfig {
            initial_state: vec![0.0, 0.0],
            gain: 1.0,
            lag_seconds: 60.0,
            disturbance_std: 0.0,
            disturbance_seed: 0,
        };
        let mut plant = FirstOrderPlant::from_config(&config, 60.0);
        let before = plant.state_vector().clone();
        let after = plant.transition_state(&dmatrix![0.5, 0.5]);

        let delta = plant.delta_vector();
        for chi in 0..2 {
            assert_relative_eq!(delta[chi], after[chi] - before[chi], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_seeded_disturbance_is_reproducible() {
        let config = PlantConfig {
            initial_state: vec![0.0],
            gain: 1.0,
            lag_seconds: 60.0,
            disturbance_std: 0.2,
            disturbance_seed: 77,
        };
        let mut a = FirstOrderPlant::from_config(&config, 60.0);
        let mut b = FirstOrderPlant::from_config(&config, 60.0);
        let control = dmatrix![1.0];

        for _ in 0..10 {
            assert_eq!(a.transition_state(&control), b.transition_state(&control));
        }
    }

    #[test]
    fn test_reporting_blends_level_drift_and_activity() {
        let config = ReportingConfig {
            initial: vec![0.0, 0.0],
            state_weight: 1.0,
            control_weight: 1.0,
        };
        let mut reporting = WeightedReporting::from_config(&config);
        let output =
            reporting.transition_state(&dvector![1.0], &dvector![0.5], &dmatrix![2.0; 2.0]);

        // level + drift = 1.5; activity = 2.0 with blends 1.0 and 1.5.
        assert_relative_eq!(output[0], 1.5 + 2.0, epsilon = 1e-12);
        assert_relative_eq!(output[1], 1.5 + 3.0, epsilon = 1e-12);
        assert_eq!(reporting.degrees_of_freedom(), 2);
    }
}
