//! Tunable parameters of a simulation run.

use grid_traffic_system_agents::{AgentTuning, DEFAULT_PLAN_COOLDOWN, DEFAULT_WAIT_PATIENCE};
use grid_traffic_system_planner::PathPlanner;
use serde::{Deserialize, Serialize};

/// Ticks between two movement passes when nothing else is configured.
pub const DEFAULT_MOVEMENT_INTERVAL: u64 = 30;

/// Configuration parameters required to construct a simulation.
///
/// Missing fields fall back to their defaults when deserialised, so scenario
/// files may override any subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks between two movement passes.
    pub movement_interval: u64,
    /// Ticks an agent waits between planning attempts.
    pub plan_cooldown: u32,
    /// Movement ticks an agent waits behind a moving agent before re-planning.
    pub wait_patience: u32,
    /// Maximum node expansions per search; unbounded when absent.
    pub planner_budget: Option<usize>,
}

impl SimulationConfig {
    pub(crate) fn tuning(&self) -> AgentTuning {
        AgentTuning::new(self.plan_cooldown, self.wait_patience)
    }

    pub(crate) fn planner(&self) -> PathPlanner {
        self.planner_budget
            .map_or_else(PathPlanner::new, PathPlanner::with_expansion_budget)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            movement_interval: DEFAULT_MOVEMENT_INTERVAL,
            plan_cooldown: DEFAULT_PLAN_COOLDOWN,
            wait_patience: DEFAULT_WAIT_PATIENCE,
            planner_budget: None,
        }
    }
}
