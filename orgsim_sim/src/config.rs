//! Simulation configuration.
//!
//! A [`SimulationConfig`] is the full JSON-serialisable description of a
//! run: horizon, random stream mode, the four agent-set tensors and the
//! parameters of the reference collaborators.

use orgsim_core::AgentSetTensors;
use serde::{Deserialize, Serialize};

/// Seconds of model time in one working day.
const WORKING_DAY_SECONDS: f64 = 8.0 * 60.0 * 60.0;

/// How the stream factory hands out random streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum StreamKind {
    /// Round-robin over a fixed seed list; runs are reproducible.
    Static { seeds: Vec<u64> },
    /// Fresh entropy per stream.
    Random,
}

/// Targets the reference board holds for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub plant_targets: Vec<f64>,
    pub reporting_targets: Vec<f64>,
}

/// First-order-lag plant parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    pub initial_state: Vec<f64>,
    /// Steady-state gain from mean control effort to process state.
    pub gain: f64,
    /// Lag time constant in seconds.
    pub lag_seconds: f64,
    /// Standard deviation of the seeded Gaussian disturbance; 0 disables it.
    #[serde(default)]
    pub disturbance_std: f64,
    #[serde(default)]
    pub disturbance_seed: u64,
}

/// Reference reporting-model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    pub initial: Vec<f64>,
    /// Weight of plant level and drift in the derived metric.
    pub state_weight: f64,
    /// Weight of mean control activity in the derived metric.
    pub control_weight: f64,
}

/// The organisation model itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgModelConfig {
    /// Duration of one tick in seconds of model time.
    pub clock_tick_seconds: f64,
    /// Control vector emitted by each discrete behavioural state, in catalog
    /// order. All vectors must share one length (the control dimension).
    pub states: Vec<Vec<f64>>,
    pub agent_set: AgentSetTensors,
    pub board: BoardConfig,
    pub plant: PlantConfig,
    pub reporting: ReportingConfig,
}

/// Complete description of a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated working days; one day is eight hours of model time.
    pub days: f64,
    pub random_stream: StreamKind,
    pub org: OrgModelConfig,
}

impl SimulationConfig {
    /// Number of ticks covered by the configured horizon.
    pub fn clock_ticks(&self) -> u64 {
        (self.days * WORKING_DAY_SECONDS / self.org.clock_tick_seconds) as u64
    }

    /// Builds a small self-consistent demo model.
    ///
    /// Agents start indifferent (uniform priority rows), states emit evenly
    /// spaced one-dimensional control levels, and modest judgment/incentive
    /// gains pull the population toward the board's targets.
    pub fn demo(agents: usize, states: usize, days: f64, seed: u64) -> Self {
        let agents = agents.max(1);
        let states = states.max(2);
        let row = 1.0 / states as f64;

        let state_controls: Vec<Vec<f64>> = (0..states)
            .map(|index| vec![index as f64 / (states - 1) as f64])
            .collect();

        let agent_set = AgentSetTensors {
            priority: vec![vec![vec![row; states]; states]; agents],
            influence: vec![vec![vec![vec![0.002; states]; states]; agents]; agents],
            judgment: vec![vec![vec![vec![0.01]; states]; states]; agents],
            incentive: vec![vec![vec![vec![0.005]; states]; states]; agents],
        };

        Self {
            days,
            random_stream: StreamKind::Static {
                seeds: vec![seed, seed.wrapping_mul(0x9e3779b97f4a7c15)],
            },
            org: OrgModelConfig {
                clock_tick_seconds: 60.0,
                states: state_controls,
                agent_set,
                board: BoardConfig {
                    plant_targets: vec![0.75],
                    reporting_targets: vec![0.5],
                },
                plant: PlantConfig {
                    initial_state: vec![0.0],
                    gain: 1.0,
                    lag_seconds: 600.0,
                    disturbance_std: 0.0,
                    disturbance_seed: seed,
                },
                reporting: ReportingConfig {
                    initial: vec![0.0],
                    state_weight: 0.6,
                    control_weight: 0.4,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_ticks_from_days() {
        let config = SimulationConfig::demo(2, 2, 1.0, 1);
        // One 8-hour day at a 60-second tick.
        assert_eq!(config.clock_ticks(), 480);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = SimulationConfig::demo(3, 3, 0.5, 7);
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: SimulationConfig = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.clock_ticks(), config.clock_ticks());
        assert_eq!(decoded.org.states, config.org.states);
        assert_eq!(
            decoded.org.agent_set.priority,
            config.org.agent_set.priority
        );
    }

    #[test]
    fn test_demo_priority_rows_are_stochastic() {
        let config = SimulationConfig::demo(4, 3, 1.0, 1);
        for plane in &config.org.agent_set.priority {
            for row in plane {
                let total: f64 = row.iter().sum();
                assert!((total - 1.0).abs() < 1e-12);
            }
        }
    }
}
